//! Render command implementation.

use super::{live, split_list, SourceArgs};
use crate::catalog::{Catalog, TableFilter};
use crate::config::{ConfigValues, OutputTarget, Settings};
use crate::dsl::{serialize_with, Document, SerializeOptions};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Run the render command
pub fn run(
    source: SourceArgs,
    filename: Option<PathBuf>,
    catalog: Option<PathBuf>,
    strict: bool,
    tables: Option<String>,
    exclude: Option<String>,
) -> Result<()> {
    let values = source.merged(ConfigValues {
        filename,
        strict: strict.then_some(true),
        tables: split_list(tables),
        exclude: split_list(exclude),
        ..ConfigValues::default()
    })?;
    let settings = Settings::resolve(values)?;

    let catalog = match catalog {
        Some(path) => {
            eprintln!("Rendering snapshot: {}", path.display());
            Catalog::load_snapshot(&path)?
        }
        None => live::load_catalog(&settings, source.progress)?,
    };

    let filter = TableFilter::new(&settings.tables, &settings.exclude)?;
    let options = SerializeOptions {
        strict_precision: settings.strict,
    };

    // Render every schema before writing, so a rendering error writes nothing
    let mut rendered = Vec::new();
    for (schema_name, target) in settings.output_targets() {
        let schema = filter.apply(catalog.require_schema(&schema_name)?);
        let document = serialize_with(&schema, &options)
            .with_context(|| format!("failed to render schema {}", schema_name))?;
        rendered.push((schema, target, document));
    }

    for (schema, target, document) in &rendered {
        write_document(target, document)?;
        eprintln!(
            "Schema {}: {} tables, {} columns, {} relation lines from {} foreign keys",
            schema.name,
            schema.tables.len(),
            schema.column_count(),
            document.relation_lines,
            document.rendered_foreign_keys.len()
        );
    }

    Ok(())
}

fn write_document(target: &OutputTarget, document: &Document) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(document.text.as_bytes())?;
            stdout.flush()?;
        }
        OutputTarget::File(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(document.text.as_bytes())?;
            eprintln!("DSL written to: {}", path.display());
        }
    }
    Ok(())
}
