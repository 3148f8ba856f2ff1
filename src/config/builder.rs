//! Configuration builder
//!
//! Merges configuration from files, environment and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Environment variable holding the Slack webhook URL
pub const SLACK_WEBHOOK_ENV: &str = "TROVEMON_SLACK_WEBHOOK";

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file, or from the default locations
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = if let Some(path) = path {
            Some(ConfigFile::load(path)?)
        } else {
            ConfigFile::load_default()?
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with the Slack webhook from the environment
    pub fn with_env(self) -> Self {
        let webhook = std::env::var(SLACK_WEBHOOK_ENV)
            .ok()
            .filter(|url| !url.is_empty());
        self.with_slack_webhook(webhook)
    }

    /// Override with CLI TCR threshold
    pub fn with_tcr_threshold(mut self, threshold: Option<f64>) -> Self {
        if let Some(t) = threshold {
            self.config.monitor.tcr_threshold = t;
        }
        self
    }

    /// Override with CLI trove CR threshold
    pub fn with_trove_cr_threshold(mut self, threshold: Option<f64>) -> Self {
        if let Some(t) = threshold {
            self.config.monitor.trove_cr_threshold = t;
        }
        self
    }

    /// Override with CLI snapshot path
    pub fn with_snapshot(mut self, path: Option<PathBuf>) -> Self {
        if let Some(p) = path {
            self.config.data_source.snapshot_path = Some(p);
        }
        self
    }

    /// Override with CLI state file path
    pub fn with_storage_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(p) = path {
            self.config.storage.path = p;
        }
        self
    }

    /// Override with a Slack webhook URL
    pub fn with_slack_webhook(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.config.notifications.slack_webhook_url = Some(u);
        }
        self
    }

    /// Override with CLI interval
    pub fn with_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.config.monitor.interval_seconds = i;
        }
        self
    }

    /// Override with CLI retry interval
    pub fn with_retry_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.config.monitor.retry_interval_seconds = i;
        }
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
