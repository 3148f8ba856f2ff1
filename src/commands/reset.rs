//! Reset command implementation
//!
//! Forgets a subject's remembered alert so the next crossing notifies again.

use super::{base_config, open_state};
use crate::alerts::StoredNotification;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, Message};
use crate::domain::Subject;
use crate::error::Result;
use std::path::PathBuf;

/// Execute the reset command
pub async fn run_reset(
    subject: &str,
    format: OutputFormat,
    config_path: Option<&str>,
    state: Option<PathBuf>,
) -> Result<()> {
    let subject: Subject = subject.parse()?;
    let config = base_config(config_path, state)?.build()?;
    let (_, gate) = open_state(&config);

    let key = subject.storage_key();
    let previous = gate.state(&key).await?;
    gate.clear(&key).await?;

    let message = match previous {
        StoredNotification::Absent => format!("{}: nothing to reset", subject),
        state => {
            log::info!("{}: cleared {}", subject, state);
            format!("{}: cleared {}", subject, state)
        }
    };

    let msg = Message {
        message,
        success: true,
    };
    print_output(&msg, format)?;
    Ok(())
}
