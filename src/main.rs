// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

mod catalog;
mod cmd;
mod config;
mod dsl;
mod loader;

use clap::Parser;
use cmd::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pg_schema_dsl=info"
    } else {
        "pg_schema_dsl=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cmd::run(cli) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
