//! Status command implementation

use super::{base_config, open_state};
use crate::alerts::NotificationGate;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, StatusReport, SubjectStatus};
use crate::config::Config;
use crate::domain::TCR_KEY;
use crate::error::Result;
use crate::storage::FileStorage;
use std::path::PathBuf;

/// Execute the status command
pub async fn run_status(
    format: OutputFormat,
    config_path: Option<&str>,
    state: Option<PathBuf>,
) -> Result<()> {
    let config = base_config(config_path, state)?.build()?;
    let (storage, gate) = open_state(&config);

    let report = collect_status(&config, &storage, &gate).await?;
    print_output(&report, format)?;
    Ok(())
}

/// State of the TCR, every configured trove, then any other remembered subject
pub async fn collect_status(
    config: &Config,
    storage: &FileStorage,
    gate: &NotificationGate,
) -> Result<StatusReport> {
    let mut subjects = vec![SubjectStatus::new(
        "TCR",
        TCR_KEY,
        &gate.state(TCR_KEY).await?,
    )];

    for trove in config.monitored_troves()? {
        let key = trove.storage_key();
        let state = gate.state(&key).await?;
        subjects.push(SubjectStatus::new(trove.name, key, &state));
    }

    // Subjects remembered from an earlier watch list
    for key in storage.entries().await?.into_keys() {
        if key.starts_with("notification/") && !subjects.iter().any(|s| s.key == key) {
            let state = gate.state(&key).await?;
            subjects.push(SubjectStatus::new(key.clone(), key, &state));
        }
    }

    Ok(StatusReport { subjects })
}
