//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod check;
pub mod config;
pub mod reset;
pub mod status;

pub use check::{run_check, run_watch};
pub use config::run_config;
pub use reset::run_reset;
pub use status::run_status;

use crate::alerts::NotificationGate;
use crate::config::{Config, ConfigBuilder};
use crate::error::Result;
use crate::storage::FileStorage;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder preloaded with the config file, environment and global overrides
pub fn base_config(config_path: Option<&str>, state: Option<PathBuf>) -> Result<ConfigBuilder> {
    Ok(ConfigBuilder::new()
        .with_file(config_path)?
        .with_env()
        .with_storage_path(state))
}

/// Persistent state and the gate reading it
fn open_state(config: &Config) -> (Arc<FileStorage>, NotificationGate) {
    log::debug!("Using state file {}", config.storage.path.display());
    let storage = Arc::new(FileStorage::new(config.storage.path.clone()));
    let gate = NotificationGate::new(storage.clone()).with_hysteresis(config.monitor.hysteresis);
    (storage, gate)
}
