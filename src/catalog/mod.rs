//! In-memory model of a database catalog.
//!
//! This module provides:
//! - Value types for schemas, tables, columns, types, foreign keys and relations
//! - A builder that assembles the model from flat catalog rows
//! - Glob-based table filtering
//! - JSON snapshots so a catalog can be rendered without a live database

mod builder;
mod filter;
mod snapshot;

pub use builder::*;
pub use filter::*;
pub use snapshot::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while assembling or validating a catalog
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown relation type: {0}")]
    UnknownRelationKind(String),

    #[error("duplicate table {table} in schema {schema}")]
    DuplicateTable { schema: String, table: String },

    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("column {table}.{column} has a precision but type {type_name} does not carry one")]
    UnexpectedPrecision {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("foreign key {foreign_key} on {table} references unknown column {column}")]
    UnknownForeignKeyColumn {
        table: String,
        foreign_key: String,
        column: String,
    },

    #[error("relation on {table} references unknown table {target}")]
    UnknownRelationTable { table: String, target: String },

    #[error("schema {0} not found in catalog")]
    SchemaNotFound(String),
}

/// Relationship classification between two tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelationKind {
    /// Many source rows reference one target row
    ManyToOne,
    /// One source row is referenced by many target rows
    OneToMany,
    /// Source and target are linked through a join table
    ManyToMany,
}

impl RelationKind {
    /// Short tag used in snapshots
    pub fn tag(self) -> &'static str {
        match self {
            RelationKind::ManyToOne => "m2o",
            RelationKind::OneToMany => "o2m",
            RelationKind::ManyToMany => "m2m",
        }
    }
}

impl FromStr for RelationKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m2o" => Ok(RelationKind::ManyToOne),
            "o2m" => Ok(RelationKind::OneToMany),
            "m2m" => Ok(RelationKind::ManyToMany),
            other => Err(CatalogError::UnknownRelationKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for RelationKind {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelationKind> for String {
    fn from(kind: RelationKind) -> Self {
        kind.tag().to_string()
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl JsonSchema for RelationKind {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "RelationKind".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "enum": ["m2o", "o2m", "m2m"]
        })
    }
}

/// Column type as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SqlType {
    /// Canonical type name (e.g. `character varying`)
    pub name: String,
    /// Storage-level alias (e.g. `varchar`), preferred for display when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_name: Option<String>,
    /// Whether columns of this type carry a numeric precision
    #[serde(default)]
    pub has_precision: bool,
    /// Whether the server falls back to a default precision when a column
    /// declares none (`timestamp`, `interval`, ...)
    #[serde(default)]
    pub implicit_precision: bool,
}

impl SqlType {
    /// Create a type without an internal alias or precision
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal_name: None,
            has_precision: false,
            implicit_precision: false,
        }
    }

    /// Set the storage-level alias
    pub fn with_internal_name(mut self, internal_name: impl Into<String>) -> Self {
        self.internal_name = Some(internal_name.into());
        self
    }

    /// Mark the type as precision-bearing
    pub fn with_precision(mut self) -> Self {
        self.has_precision = true;
        self
    }

    /// Mark the precision as optional: an unconstrained column uses the
    /// server default
    pub fn with_implicit_precision(mut self) -> Self {
        self.implicit_precision = true;
        self
    }

    /// Name used for display: internal alias first, canonical name otherwise
    pub fn display_name(&self) -> &str {
        self.internal_name.as_deref().unwrap_or(&self.name)
    }
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column type
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    /// Whether the column rejects NULL values
    #[serde(default)]
    pub not_null: bool,
    /// Whether this column is part of the primary key
    #[serde(default)]
    pub primary_key: bool,
    /// Numeric precision, only meaningful for precision-bearing types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

impl Column {
    /// Create a nullable, non-key column
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            primary_key: false,
            precision: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// True when the type expects a precision the catalog did not supply
    pub fn is_missing_precision(&self) -> bool {
        self.sql_type.has_precision
            && !self.sql_type.implicit_precision
            && self.precision.is_none()
    }
}

/// One entry of the index backing a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IndexEntry {
    /// Plain column of the referenced table
    Column(String),
    /// Index expression (e.g. `lower(email)`)
    Expression(String),
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    /// Constraint name, unique within a schema
    pub name: String,
    /// Source-side column names, in constraint order
    pub columns: Vec<String>,
    /// Entries of the referenced index, in index order
    pub index: Vec<IndexEntry>,
}

impl ForeignKey {
    /// First index entry that is a plain column (the target-side join column)
    pub fn join_column(&self) -> Option<&str> {
        self.index.iter().find_map(|entry| match entry {
            IndexEntry::Column(name) => Some(name.as_str()),
            IndexEntry::Expression(_) => None,
        })
    }
}

/// Join table used by a many-to-many relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JoinPath {
    /// Join table name
    pub table: String,
    /// Foreign key from the join table to the relation's target
    pub target_foreign_key: ForeignKey,
}

/// Directed relation between two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    /// Relation classification
    pub kind: RelationKind,
    /// Table the relation originates from
    pub source_table: String,
    /// Schema of the target table, when it is not the relation's own schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<String>,
    /// Table the relation points to
    pub target_table: String,
    /// Foreign key backing the relation
    pub foreign_key: ForeignKey,
    /// Join table, for many-to-many relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinPath>,
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns in catalog order
    pub columns: Vec<Column>,
    /// Relations originating from this table
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Many-to-one relations, in relation order
    pub fn m2o_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::ManyToOne)
    }
}

/// Named namespace of tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    /// Schema name
    pub name: String,
    /// Tables in insertion order
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Total number of columns across all tables
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Check the model invariants
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut table_names = HashSet::new();
        for table in &self.tables {
            if !table_names.insert(table.name.as_str()) {
                return Err(CatalogError::DuplicateTable {
                    schema: self.name.clone(),
                    table: table.name.clone(),
                });
            }
        }

        for table in &self.tables {
            let mut column_names = HashSet::new();
            for column in &table.columns {
                if !column_names.insert(column.name.as_str()) {
                    return Err(CatalogError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                if column.precision.is_some() && !column.sql_type.has_precision {
                    return Err(CatalogError::UnexpectedPrecision {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        type_name: column.sql_type.name.clone(),
                    });
                }
            }

            for relation in table.relations.iter().filter(|r| r.target_schema.is_none()) {
                for name in [&relation.source_table, &relation.target_table] {
                    if !table_names.contains(name.as_str()) {
                        return Err(CatalogError::UnknownRelationTable {
                            table: table.name.clone(),
                            target: name.clone(),
                        });
                    }
                }

                // Source columns live on the source table, except for m2m where
                // they live on the join table.
                let owner = match &relation.join {
                    Some(join) => join.table.as_str(),
                    None if relation.kind == RelationKind::OneToMany => {
                        relation.target_table.as_str()
                    }
                    None => relation.source_table.as_str(),
                };
                let Some(owner_table) = self.table(owner) else {
                    return Err(CatalogError::UnknownRelationTable {
                        table: table.name.clone(),
                        target: owner.to_string(),
                    });
                };
                for column in &relation.foreign_key.columns {
                    if owner_table.column(column).is_none() {
                        return Err(CatalogError::UnknownForeignKeyColumn {
                            table: owner.to_string(),
                            foreign_key: relation.foreign_key.name.clone(),
                            column: column.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// The loaded set of schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    /// Schemas in load order
    pub schemas: Vec<Schema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a schema by name
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Get a schema by name, failing when it was not loaded
    pub fn require_schema(&self, name: &str) -> Result<&Schema, CatalogError> {
        self.schema(name)
            .ok_or_else(|| CatalogError::SchemaNotFound(name.to_string()))
    }

    /// Check the model invariants of every schema, including relations that
    /// cross into another loaded schema
    pub fn validate(&self) -> Result<(), CatalogError> {
        for schema in &self.schemas {
            schema.validate()?;
            for table in &schema.tables {
                for relation in &table.relations {
                    let Some(target_schema) = &relation.target_schema else {
                        continue;
                    };
                    let found = self
                        .schema(target_schema)
                        .and_then(|s| s.table(&relation.target_table))
                        .is_some();
                    if !found || schema.table(&relation.source_table).is_none() {
                        return Err(CatalogError::UnknownRelationTable {
                            table: table.name.clone(),
                            target: format!("{}.{}", target_schema, relation.target_table),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
