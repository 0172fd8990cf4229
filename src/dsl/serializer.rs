//! Table blocks and full documents.

use super::{format_relation, format_type, DslError, RenderedForeignKeys};
use crate::catalog::{Schema, Table};

/// Serialization settings
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Fail on precision-bearing columns without a precision instead of
    /// rendering them without a suffix
    pub strict_precision: bool,
}

/// A single table rendered to DSL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    /// Table block: header, one line per column, closing brace
    pub definition: String,
    /// Many-to-one relation lines, newline separated (may be empty)
    pub relations: String,
}

/// Output of a serialization call
#[derive(Debug, Clone)]
pub struct Document {
    /// The DSL document
    pub text: String,
    /// Foreign keys that produced relation lines
    pub rendered_foreign_keys: RenderedForeignKeys,
    /// Number of relation lines in the document
    pub relation_lines: usize,
}

/// Render a table's definition block and its many-to-one relation lines
pub fn render_table(
    table: &Table,
    rendered: &mut RenderedForeignKeys,
    options: &SerializeOptions,
) -> Result<RenderedTable, DslError> {
    let mut body = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        if column.is_missing_precision() {
            if options.strict_precision {
                return Err(DslError::MissingPrecision {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
            tracing::warn!(
                table = %table.name,
                column = %column.name,
                "precision missing, rendering type without it"
            );
        }
        body.push(format!("    {}: {} ", column.name, format_type(column)));
    }

    let definition = format!("{} [] {{ \n{}\n}}", table.name, body.join("\n"));

    let mut lines = Vec::new();
    for relation in table.m2o_relations() {
        lines.extend(format_relation(relation, rendered)?);
    }

    Ok(RenderedTable {
        definition,
        relations: lines.join("\n"),
    })
}

/// Serialize a schema with explicit options.
///
/// The rendered foreign key set starts empty on every call.
pub fn serialize_with(schema: &Schema, options: &SerializeOptions) -> Result<Document, DslError> {
    let mut rendered = RenderedForeignKeys::new();
    let mut definitions = Vec::with_capacity(schema.tables.len());
    let mut relations = Vec::with_capacity(schema.tables.len());

    for table in &schema.tables {
        let table = render_table(table, &mut rendered, options)?;
        definitions.push(table.definition);
        relations.push(table.relations);
    }

    let relation_lines: usize = relations
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| group.lines().count())
        .sum();

    tracing::debug!(
        schema = %schema.name,
        tables = definitions.len(),
        relation_lines,
        foreign_keys = rendered.len(),
        "serialized schema"
    );

    let text = format!("{}\n\n{}", definitions.join("\n\n"), relations.join("\n"));

    Ok(Document {
        text,
        rendered_foreign_keys: rendered,
        relation_lines,
    })
}

/// Serialize a schema with default options
pub fn serialize(schema: &Schema) -> Result<String, DslError> {
    serialize_with(schema, &SerializeOptions::default()).map(|doc| doc.text)
}
