//! Glob-based table selection.

use super::{Schema, Table};
use ahash::AHashSet;
use anyhow::{Context, Result};
use glob::Pattern;

/// Include/exclude patterns over table names
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TableFilter {
    /// Compile include and exclude patterns (e.g. `audit_*`)
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// True when no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether a table name passes the filter
    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(name))
    }

    /// Copy of the schema keeping only matching tables.
    ///
    /// Relations that touch a removed table are dropped with it. Patterns only
    /// select tables of this schema, so relations into another schema are kept.
    pub fn apply(&self, schema: &Schema) -> Schema {
        if self.is_empty() {
            return schema.clone();
        }

        let kept: AHashSet<&str> = schema
            .tables
            .iter()
            .map(|t| t.name.as_str())
            .filter(|name| self.matches(name))
            .collect();

        let tables = schema
            .tables
            .iter()
            .filter(|t| kept.contains(t.name.as_str()))
            .map(|t| Table {
                name: t.name.clone(),
                columns: t.columns.clone(),
                relations: t
                    .relations
                    .iter()
                    .filter(|r| {
                        kept.contains(r.source_table.as_str())
                            && (r.target_schema.is_some()
                                || kept.contains(r.target_table.as_str()))
                            && r.join
                                .as_ref()
                                .map_or(true, |j| kept.contains(j.table.as_str()))
                    })
                    .cloned()
                    .collect(),
            })
            .collect();

        Schema {
            name: schema.name.clone(),
            tables,
        }
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| Pattern::new(p).with_context(|| format!("invalid table pattern: {}", p)))
        .collect()
}
