//! Config command implementation

use super::base_config;
use crate::cli::args::{ConfigArgs, ConfigCommands, OutputFormat};
use crate::cli::output::{print_output, Message};
use crate::config::{Config, ConfigFile};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Execute a config subcommand
pub fn run_config(
    args: &ConfigArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    state: Option<PathBuf>,
) -> Result<()> {
    match &args.command {
        ConfigCommands::Init { path, force } => {
            let path = path.clone().unwrap_or_else(ConfigFile::user_path);
            init_config(&path, *force)?;

            let msg = Message {
                message: format!("Wrote default configuration to {}", path.display()),
                success: true,
            };
            print_output(&msg, format)?;
        }
        ConfigCommands::Show => {
            let config = base_config(config_path, state)?.build()?;
            print_output(&config, format)?;
        }
    }

    Ok(())
}

/// Write the default configuration to `path`
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            key: path.display().to_string(),
            message: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    ConfigFile::save(&Config::default(), path)?;
    log::info!("Wrote configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trovemon.toml");

        init_config(&path, false).unwrap();
        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.troves.len(), 3);

        // Refuses to clobber without --force
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());
    }
}
