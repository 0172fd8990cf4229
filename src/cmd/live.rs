//! Live catalog loading shared by the render and snapshot commands.

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::loader;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Load the configured schemas from the live database
pub fn load_catalog(settings: &Settings, progress: bool) -> Result<Catalog> {
    let connection = settings.connection()?;

    let pb = if progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!(
            "Loading catalog from {}:{}/{}...",
            connection.host, connection.port, connection.database
        ));
        Some(pb)
    } else {
        None
    };

    let result = loader::load_catalog(&connection, &settings.schemas);

    if let Some(pb) = pb {
        match &result {
            Ok(_) => pb.finish_with_message("done"),
            Err(_) => pb.abandon_with_message("failed"),
        }
    }

    result
}
