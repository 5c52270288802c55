//! Workspace initialization: starter config plus the `.nyron/` structure.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::config::sample_config;
use crate::error::Result;
use crate::store::Workspace;
use crate::ui;

/// Write a starter `nyron.toml` and create the ledger directory.
///
/// An existing config file is left alone unless `force` is set; the ledger
/// init is idempotent either way.
pub fn init(workspace: &Workspace, force: bool, now: DateTime<Utc>) -> Result<PathBuf> {
    let config_path = workspace.root().join("nyron.toml");

    if config_path.exists() && !force {
        ui::display_warning("nyron.toml already exists. Use --force to overwrite.");
    } else {
        fs::write(&config_path, sample_config())?;
        ui::display_success(&format!("Created {}", config_path.display()));
    }

    workspace.init(now)?;
    ui::display_success("Initialized .nyron workspace");
    Ok(config_path)
}
