//! Catalog assembly from flat catalog rows.

use super::{
    Catalog, Column, ForeignKey, IndexEntry, JoinPath, Relation, RelationKind, Schema, SqlType,
    Table,
};
use ahash::AHashSet;
use std::collections::BTreeMap;

/// A column as returned by the catalog query
#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Column position within the table (1-based in PostgreSQL)
    pub ordinal: i32,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub precision: Option<u32>,
}

/// One source column of a foreign key
#[derive(Debug, Clone)]
pub struct ForeignKeyRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub target_schema: String,
    pub target_table: String,
    pub column: String,
    pub position: i32,
}

/// One entry of the index referenced by a foreign key
#[derive(Debug, Clone)]
pub struct IndexEntryRow {
    pub schema: String,
    pub table: String,
    pub foreign_key: String,
    pub position: i32,
    pub entry: IndexEntry,
}

#[derive(Debug, Default)]
struct ForeignKeyDraft {
    target_schema: String,
    target_table: String,
    columns: Vec<(i32, String)>,
    index: Vec<(i32, IndexEntry)>,
}

impl ForeignKeyDraft {
    fn finish(mut self, name: String) -> (String, String, ForeignKey) {
        self.columns.sort_by_key(|(pos, _)| *pos);
        self.index.sort_by_key(|(pos, _)| *pos);
        let fk = ForeignKey {
            name,
            columns: self.columns.into_iter().map(|(_, c)| c).collect(),
            index: self.index.into_iter().map(|(_, e)| e).collect(),
        };
        (self.target_schema, self.target_table, fk)
    }
}

#[derive(Debug, Default)]
struct TableDraft {
    columns: Vec<(i32, Column)>,
    primary_key: AHashSet<String>,
    foreign_keys: BTreeMap<String, ForeignKeyDraft>,
}

/// Builder for assembling a catalog from the rows of the catalog queries
///
/// Tables come out ordered by name, columns by ordinal position and foreign
/// keys by constraint name. Relations are derived once all rows are in.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    schema_order: Vec<String>,
    schemas: BTreeMap<String, BTreeMap<String, TableDraft>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, keeping first-registration order
    pub fn add_schema(&mut self, schema: &str) {
        if !self.schemas.contains_key(schema) {
            self.schema_order.push(schema.to_string());
            self.schemas.insert(schema.to_string(), BTreeMap::new());
        }
    }

    /// Register a table, even if it turns out to have no columns
    pub fn add_table(&mut self, schema: &str, table: &str) {
        self.table_mut(schema, table);
    }

    pub fn add_column(&mut self, row: ColumnRow) {
        let draft = self.table_mut(&row.schema, &row.table);
        let mut column = Column::new(row.name, row.sql_type);
        column.not_null = row.not_null;
        column.precision = row.precision;
        draft.columns.push((row.ordinal, column));
    }

    pub fn add_primary_key_column(&mut self, schema: &str, table: &str, column: &str) {
        self.table_mut(schema, table)
            .primary_key
            .insert(column.to_string());
    }

    pub fn add_foreign_key_column(&mut self, row: ForeignKeyRow) {
        let draft = self.foreign_key_mut(&row.schema, &row.table, &row.name);
        draft.target_schema = row.target_schema;
        draft.target_table = row.target_table;
        draft.columns.push((row.position, row.column));
    }

    pub fn add_index_entry(&mut self, row: IndexEntryRow) {
        self.foreign_key_mut(&row.schema, &row.table, &row.foreign_key)
            .index
            .push((row.position, row.entry));
    }

    fn table_mut(&mut self, schema: &str, table: &str) -> &mut TableDraft {
        self.add_schema(schema);
        self.schemas
            .entry(schema.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default()
    }

    fn foreign_key_mut(&mut self, schema: &str, table: &str, name: &str) -> &mut ForeignKeyDraft {
        self.table_mut(schema, table)
            .foreign_keys
            .entry(name.to_string())
            .or_default()
    }

    /// Assemble the catalog and derive relations
    pub fn build(mut self) -> Catalog {
        let loaded: AHashSet<(String, String)> = self
            .schemas
            .iter()
            .flat_map(|(schema, tables)| {
                tables
                    .keys()
                    .map(move |table| (schema.clone(), table.clone()))
            })
            .collect();

        let mut catalog = Catalog::new();
        let mut links = Vec::new();
        for name in std::mem::take(&mut self.schema_order) {
            let tables = self.schemas.remove(&name).unwrap_or_default();
            catalog
                .schemas
                .push(build_tables(name, tables, &loaded, &mut links));
        }

        for (schema, table, relation) in derive_relations(&links) {
            if let Some(table) = catalog
                .schemas
                .iter_mut()
                .find(|s| s.name == schema)
                .and_then(|s| s.tables.iter_mut().find(|t| t.name == table))
            {
                table.relations.push(relation);
            }
        }

        catalog
    }
}

/// A foreign key between two loaded tables
struct Link {
    schema: String,
    table: String,
    target_schema: String,
    target_table: String,
    foreign_key: ForeignKey,
}

impl Link {
    /// Schema qualifier for a relation living in `from` and pointing into `to`
    fn qualifier(from: &str, to: &str) -> Option<String> {
        (from != to).then(|| to.to_string())
    }
}

fn build_tables(
    name: String,
    drafts: BTreeMap<String, TableDraft>,
    loaded: &AHashSet<(String, String)>,
    links: &mut Vec<Link>,
) -> Schema {
    let mut schema = Schema::new(name);

    for (table_name, mut draft) in drafts {
        draft.columns.sort_by_key(|(ordinal, _)| *ordinal);
        let mut table = Table::new(table_name.clone());
        table.columns = draft
            .columns
            .into_iter()
            .map(|(_, mut column)| {
                column.primary_key = draft.primary_key.contains(&column.name);
                column
            })
            .collect();

        for (fk_name, fk_draft) in draft.foreign_keys {
            let (target_schema, target_table, fk) = fk_draft.finish(fk_name);
            if !loaded.contains(&(target_schema.clone(), target_table.clone())) {
                tracing::warn!(
                    foreign_key = %fk.name,
                    target = %format!("{}.{}", target_schema, target_table),
                    "skipping foreign key to a table that was not loaded"
                );
                continue;
            }
            links.push(Link {
                schema: schema.name.clone(),
                table: table_name.clone(),
                target_schema,
                target_table,
                foreign_key: fk,
            });
        }

        schema.tables.push(table);
    }

    schema
}

/// Relations keyed by the (schema, table) they belong to
fn derive_relations(links: &[Link]) -> Vec<(String, String, Relation)> {
    let mut relations = Vec::new();

    for link in links {
        relations.push((
            link.schema.clone(),
            link.table.clone(),
            Relation {
                kind: RelationKind::ManyToOne,
                source_table: link.table.clone(),
                target_schema: Link::qualifier(&link.schema, &link.target_schema),
                target_table: link.target_table.clone(),
                foreign_key: link.foreign_key.clone(),
                join: None,
            },
        ));
        relations.push((
            link.target_schema.clone(),
            link.target_table.clone(),
            Relation {
                kind: RelationKind::OneToMany,
                source_table: link.target_table.clone(),
                target_schema: Link::qualifier(&link.target_schema, &link.schema),
                target_table: link.table.clone(),
                foreign_key: link.foreign_key.clone(),
                join: None,
            },
        ));
    }

    // Any table with two or more foreign keys into its own schema links their
    // targets pairwise
    let mut join_tables: Vec<(&str, &str)> = Vec::new();
    for link in links {
        let key = (link.schema.as_str(), link.table.as_str());
        if !join_tables.contains(&key) {
            join_tables.push(key);
        }
    }
    for (schema, join_table) in join_tables {
        let outgoing: Vec<&Link> = links
            .iter()
            .filter(|l| l.schema == schema && l.table == join_table)
            .filter(|l| l.target_schema == schema)
            .collect();
        if outgoing.len() < 2 {
            continue;
        }
        for (i, from) in outgoing.iter().enumerate() {
            for (j, to) in outgoing.iter().enumerate() {
                if i == j {
                    continue;
                }
                relations.push((
                    schema.to_string(),
                    from.target_table.clone(),
                    Relation {
                        kind: RelationKind::ManyToMany,
                        source_table: from.target_table.clone(),
                        target_schema: None,
                        target_table: to.target_table.clone(),
                        foreign_key: from.foreign_key.clone(),
                        join: Some(JoinPath {
                            table: join_table.to_string(),
                            target_foreign_key: to.foreign_key.clone(),
                        }),
                    },
                ));
            }
        }
    }

    relations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &str, name: &str, ordinal: i32) -> ColumnRow {
        ColumnRow {
            schema: "public".to_string(),
            table: table.to_string(),
            name: name.to_string(),
            ordinal,
            sql_type: SqlType::new("integer"),
            not_null: false,
            precision: None,
        }
    }

    #[test]
    fn test_columns_sorted_by_ordinal() {
        let mut builder = CatalogBuilder::new();
        builder.add_column(column("users", "name", 2));
        builder.add_column(column("users", "id", 1));
        builder.add_primary_key_column("public", "users", "id");

        let catalog = builder.build();
        let users = catalog.schema("public").unwrap().table("users").unwrap();
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(users.columns[0].primary_key);
        assert!(!users.columns[1].primary_key);
    }

    #[test]
    fn test_schema_order_follows_registration() {
        let mut builder = CatalogBuilder::new();
        builder.add_schema("zeta");
        builder.add_schema("alpha");
        builder.add_schema("zeta");

        let catalog = builder.build();
        let names: Vec<&str> = catalog.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    fn foreign_key(schema: &str, table: &str, target_schema: &str, target: &str) -> ForeignKeyRow {
        ForeignKeyRow {
            schema: schema.to_string(),
            table: table.to_string(),
            name: format!("{}_user_id_fkey", table),
            target_schema: target_schema.to_string(),
            target_table: target.to_string(),
            column: "user_id".to_string(),
            position: 1,
        }
    }

    #[test]
    fn test_foreign_key_to_unloaded_table_skipped() {
        let mut builder = CatalogBuilder::new();
        builder.add_column(column("orders", "user_id", 1));
        builder.add_foreign_key_column(foreign_key("public", "orders", "auth", "users"));

        let catalog = builder.build();
        let orders = catalog.schema("public").unwrap().table("orders").unwrap();
        assert!(orders.relations.is_empty());
        assert!(catalog.schema("auth").is_none());
    }

    #[test]
    fn test_cross_schema_foreign_key_between_loaded_schemas() {
        let mut builder = CatalogBuilder::new();
        builder.add_column(column("orders", "user_id", 1));
        builder.add_column(ColumnRow {
            schema: "auth".to_string(),
            ..column("users", "id", 1)
        });
        builder.add_foreign_key_column(foreign_key("public", "orders", "auth", "users"));

        let catalog = builder.build();
        let orders = catalog.schema("public").unwrap().table("orders").unwrap();
        assert_eq!(orders.relations.len(), 1);
        assert_eq!(orders.relations[0].kind, RelationKind::ManyToOne);
        assert_eq!(orders.relations[0].target_schema.as_deref(), Some("auth"));
        assert_eq!(orders.relations[0].target_table, "users");

        let users = catalog.schema("auth").unwrap().table("users").unwrap();
        assert_eq!(users.relations.len(), 1);
        assert_eq!(users.relations[0].kind, RelationKind::OneToMany);
        assert_eq!(users.relations[0].target_schema.as_deref(), Some("public"));

        assert_eq!(catalog.validate(), Ok(()));
    }
}
