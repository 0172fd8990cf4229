mod live;
mod render;
mod snapshot;

use crate::config::ConfigValues;
use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pg-schema-dsl")]
#[command(version)]
#[command(about = "Render a PostgreSQL schema as a compact diagram DSL", long_about = None)]
pub struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and selection options shared by the database commands
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// YAML config file; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Schemas to include (comma-separated or repeated) [default: public]
    #[arg(short, long, value_delimiter = ',')]
    pub schema: Vec<String>,

    /// Database host [default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// Database port [default: 5432]
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name
    #[arg(short, long)]
    pub database: Option<String>,

    /// Database user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Database password
    #[arg(long)]
    pub password: Option<String>,

    /// Show a spinner while the catalog loads
    #[arg(short, long)]
    pub progress: bool,
}

impl SourceArgs {
    /// Command-line values, without file or defaults applied
    fn values(&self) -> ConfigValues {
        ConfigValues {
            schema: Some(self.schema.clone()),
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            ..ConfigValues::default()
        }
    }

    /// Merge the config file (if any) with the command-line values
    fn merged(&self, overrides: ConfigValues) -> anyhow::Result<ConfigValues> {
        let file = match &self.config {
            Some(path) => ConfigValues::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ConfigValues::default(),
        };
        Ok(file.overlay(self.values()).overlay(overrides))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render schemas as DSL documents
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file, `-` for stdout [default: output.txt]
        /// With several schemas, one file per schema: <stem>.<schema>.<ext>
        #[arg(short, long)]
        filename: Option<PathBuf>,

        /// Render from a catalog snapshot instead of a live database
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Fail on precision types without a precision
        #[arg(long)]
        strict: bool,

        /// Only render tables matching these glob patterns (comma-separated)
        #[arg(short, long)]
        tables: Option<String>,

        /// Skip tables matching these glob patterns (comma-separated)
        #[arg(short, long)]
        exclude: Option<String>,
    },

    /// Save the loaded catalog as a JSON snapshot
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the JSON Schema of the snapshot format
    SnapshotSchema,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render {
            source,
            filename,
            catalog,
            strict,
            tables,
            exclude,
        } => render::run(source, filename, catalog, strict, tables, exclude),
        Commands::Snapshot { source, output } => snapshot::run(source, output),
        Commands::SnapshotSchema => snapshot::print_schema(),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "pg-schema-dsl",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

/// Split a comma-separated flag into trimmed, non-empty parts
fn split_list(value: Option<String>) -> Option<Vec<String>> {
    value.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
