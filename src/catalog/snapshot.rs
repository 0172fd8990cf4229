//! JSON snapshots of a loaded catalog.

use super::Catalog;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Catalog {
    /// Parse and validate a snapshot
    pub fn from_snapshot_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize the catalog as pretty JSON
    pub fn to_snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a snapshot file
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog snapshot {}", path.display()))?;
        Self::from_snapshot_json(&content)
            .with_context(|| format!("invalid catalog snapshot {}", path.display()))
    }
}

/// JSON Schema describing the snapshot format
pub fn snapshot_json_schema() -> schemars::Schema {
    schemars::schema_for!(Catalog)
}
