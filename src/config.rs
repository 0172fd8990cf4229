//! Configuration for the render and snapshot commands.
//!
//! Settings come from an optional YAML file, overlaid by command-line flags:
//!
//! ```yaml
//! host: db.internal
//! port: 5432
//! database: shop
//! user: reader
//! password: secret
//! schema: [public, billing]
//! filename: schema.txt
//! strict: false
//! tables: ["*"]
//! exclude: ["audit_*"]
//! ```

use crate::loader::ConnectionConfig;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_FILENAME: &str = "output.txt";

/// Values that may come from the YAML file or from the command line.
///
/// Every field is optional; [`Settings::resolve`] applies defaults and
/// reports missing required values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigValues {
    /// Schemas to load and render
    pub schema: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Output file, `-` for stdout
    pub filename: Option<PathBuf>,
    /// Fail on precision-bearing columns without a precision
    pub strict: Option<bool>,
    /// Table include patterns
    pub tables: Option<Vec<String>>,
    /// Table exclude patterns
    pub exclude: Option<Vec<String>>,
}

impl ConfigValues {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ConfigValues = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn overlay(self, other: ConfigValues) -> ConfigValues {
        ConfigValues {
            schema: other.schema.filter(|s| !s.is_empty()).or(self.schema),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            database: other.database.or(self.database),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            filename: other.filename.or(self.filename),
            strict: other.strict.or(self.strict),
            tables: other.tables.filter(|t| !t.is_empty()).or(self.tables),
            exclude: other.exclude.filter(|e| !e.is_empty()).or(self.exclude),
        }
    }
}

/// Where a rendered document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub schemas: Vec<String>,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub filename: PathBuf,
    pub strict: bool,
    pub tables: Vec<String>,
    pub exclude: Vec<String>,
}

impl Settings {
    /// Apply defaults to the merged configuration values
    pub fn resolve(values: ConfigValues) -> Result<Self> {
        let schemas: Vec<String> = values
            .schema
            .unwrap_or_default()
            .iter()
            .flat_map(|s| s.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut unique = Vec::with_capacity(schemas.len());
        for schema in schemas {
            if !unique.contains(&schema) {
                unique.push(schema);
            }
        }
        if unique.is_empty() {
            unique.push(DEFAULT_SCHEMA.to_string());
        }

        let filename = values
            .filename
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME));
        if filename.as_os_str().is_empty() {
            bail!("filename must not be empty");
        }

        Ok(Self {
            schemas: unique,
            host: values.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: values.port.unwrap_or(DEFAULT_PORT),
            database: values.database,
            user: values.user,
            password: values.password,
            filename,
            strict: values.strict.unwrap_or(false),
            tables: values.tables.unwrap_or_default(),
            exclude: values.exclude.unwrap_or_default(),
        })
    }

    /// Connection parameters, failing when a required one is missing
    pub fn connection(&self) -> Result<ConnectionConfig> {
        Ok(ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            database: required("database", &self.database)?,
            user: required("user", &self.user)?,
            password: required("password", &self.password)?,
        })
    }

    /// Output target for each configured schema, in schema order
    pub fn output_targets(&self) -> Vec<(String, OutputTarget)> {
        let multiple = self.schemas.len() > 1;
        self.schemas
            .iter()
            .map(|schema| {
                let target = if self.filename == Path::new("-") {
                    OutputTarget::Stdout
                } else if multiple {
                    OutputTarget::File(schema_output_path(&self.filename, schema))
                } else {
                    OutputTarget::File(self.filename.clone())
                };
                (schema.clone(), target)
            })
            .collect()
    }
}

fn required(name: &str, value: &Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v.clone()),
        None => bail!("missing required option: {}", name),
    }
}

/// Insert the schema name before the file extension
/// (`out/schema.txt` becomes `out/schema.billing.txt`)
pub fn schema_output_path(filename: &Path, schema: &str) -> PathBuf {
    let stem = filename
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match filename.extension() {
        Some(ext) => format!("{}.{}.{}", stem, schema, ext.to_string_lossy()),
        None => format!("{}.{}", stem, schema),
    };
    filename.with_file_name(name)
}
