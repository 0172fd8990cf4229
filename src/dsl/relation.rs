//! Relation lines.

use super::DslError;
use crate::catalog::{Relation, RelationKind};
use ahash::AHashSet;

impl RelationKind {
    /// Direction symbol used between the two column references
    pub fn symbol(self) -> &'static str {
        match self {
            RelationKind::ManyToOne => ">",
            RelationKind::OneToMany => "<",
            RelationKind::ManyToMany => "<>",
        }
    }
}

/// Names of the foreign keys rendered during one serialization call.
///
/// Recorded for reporting only: a foreign key appearing twice is rendered
/// twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedForeignKeys {
    names: AHashSet<String>,
}

impl RenderedForeignKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a foreign key, returning false if it was already seen
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Recorded names in sorted order
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Render one line per source column of the relation's foreign key.
///
/// Every line points at the same target column: the first plain column of the
/// index referenced by the foreign key.
pub fn format_relation(
    relation: &Relation,
    rendered: &mut RenderedForeignKeys,
) -> Result<Vec<String>, DslError> {
    let symbol = relation.kind.symbol();
    let fk = &relation.foreign_key;

    let target_column = fk
        .join_column()
        .ok_or_else(|| DslError::MissingJoinColumn {
            foreign_key: fk.name.clone(),
        })?;

    rendered.insert(&fk.name);

    Ok(fk
        .columns
        .iter()
        .map(|column| {
            format!(
                "{}.{} {} {}.{}",
                relation.source_table, column, symbol, relation.target_table, target_column
            )
        })
        .collect())
}
