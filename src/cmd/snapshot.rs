//! Snapshot command implementation.

use super::{live, SourceArgs};
use crate::catalog::snapshot_json_schema;
use crate::config::{ConfigValues, Settings};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Run the snapshot command
pub fn run(source: SourceArgs, output: Option<PathBuf>) -> Result<()> {
    let settings = Settings::resolve(source.merged(ConfigValues::default())?)?;
    let catalog = live::load_catalog(&settings, source.progress)?;
    let json = catalog.to_snapshot_json()?;

    if let Some(ref out_path) = output {
        let mut file = File::create(out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        file.write_all(json.as_bytes())?;
        eprintln!("Snapshot written to: {}", out_path.display());
    } else {
        println!("{}", json);
    }

    let tables: usize = catalog.schemas.iter().map(|s| s.tables.len()).sum();
    eprintln!(
        "Snapshot: {} schemas, {} tables",
        catalog.schemas.len(),
        tables
    );

    Ok(())
}

/// Print the JSON Schema of the snapshot format
pub fn print_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&snapshot_json_schema())?);
    Ok(())
}
