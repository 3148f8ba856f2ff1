//! Configuration system
//!
//! Handles TOML config file parsing, validation and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::DEFAULT_HYSTERESIS;
use crate::domain::{Address, MonitoredTrove};
use crate::error::{ConfigError, DomainError};
use crate::services::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Thresholds and run settings
    pub monitor: MonitorSettings,
    /// Troves to watch, in evaluation order
    pub troves: Vec<TroveConfig>,
    /// Enabled price sources
    pub price_sources: PriceSourcesConfig,
    /// Notification targets
    pub notifications: NotificationsConfig,
    /// Persistent state
    pub storage: StorageConfig,
    /// Chain data
    pub data_source: DataSourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings::default(),
            troves: default_troves(),
            price_sources: PriceSourcesConfig::default(),
            notifications: NotificationsConfig::default(),
            storage: StorageConfig::default(),
            data_source: DataSourceConfig::default(),
        }
    }
}

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Protocol TCR alert threshold
    pub tcr_threshold: f64,
    /// Per-trove CR alert threshold
    pub trove_cr_threshold: f64,
    /// Relative recovery band above a threshold
    pub hysteresis: f64,
    /// Price source timeout in milliseconds
    pub price_timeout_ms: u64,
    /// Store the winning price each run
    pub record_price: bool,
    /// Interval between runs in `watch` mode, in seconds
    pub interval_seconds: u64,
    /// Enable retry on errors
    pub retry: bool,
    /// Retry interval in seconds
    pub retry_interval_seconds: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tcr_threshold: 2.0,
            trove_cr_threshold: 1.5,
            hysteresis: DEFAULT_HYSTERESIS,
            price_timeout_ms: 10_000,
            record_price: false,
            interval_seconds: 60,
            retry: true,
            retry_interval_seconds: 10,
        }
    }
}

/// A configured trove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroveConfig {
    /// Name used in alerts
    pub name: String,
    /// Owner address
    pub address: String,
}

impl TroveConfig {
    fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
        }
    }
}

/// Default watch list
pub fn default_troves() -> Vec<TroveConfig> {
    vec![
        TroveConfig::new("Risky Trove #1", "0xe360934C02B4D0f0de602ea09a4ddE73287E603F"),
        TroveConfig::new("Risky Trove #2", "0xb884F2Fe0d515c82D07C4E9b1E9f75064D079B2b"),
        TroveConfig::new("Risky Trove #3", "0x5F1A4100cC68bbe706f37f39755C6e3a1CF999d6"),
    ]
}

/// Price source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSourcesConfig {
    /// Query CoinGecko
    pub coingecko: bool,
    /// Override the CoinGecko endpoint
    pub coingecko_url: Option<String>,
    /// Query the protocol's own price feed
    pub price_feed: bool,
}

impl Default for PriceSourcesConfig {
    fn default() -> Self {
        Self {
            coingecko: true,
            coingecko_url: None,
            price_feed: true,
        }
    }
}

/// Notification target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Print alerts to the terminal
    pub terminal: bool,
    /// Slack incoming webhook URL
    pub slack_webhook_url: Option<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            terminal: true,
            slack_webhook_url: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State file path
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("trovemon").join("state.json"))
        .unwrap_or_else(|| PathBuf::from("trovemon-state.json"))
}

/// Chain data source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataSourceConfig {
    /// JSON chain snapshot to read
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Check values the type system cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("monitor.tcr_threshold", self.monitor.tcr_threshold)?;
        check_threshold("monitor.trove_cr_threshold", self.monitor.trove_cr_threshold)?;

        let hysteresis = self.monitor.hysteresis;
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            return Err(invalid(
                "monitor.hysteresis",
                DomainError::InvalidHysteresis(hysteresis),
            ));
        }

        for (key, value) in [
            ("monitor.price_timeout_ms", self.monitor.price_timeout_ms),
            ("monitor.interval_seconds", self.monitor.interval_seconds),
            ("monitor.retry_interval_seconds", self.monitor.retry_interval_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        self.monitored_troves()?;
        Ok(())
    }

    /// Parsed watch list
    pub fn monitored_troves(&self) -> Result<Vec<MonitoredTrove>, ConfigError> {
        self.troves
            .iter()
            .enumerate()
            .map(|(i, trove)| {
                let address = Address::new(&trove.address)
                    .map_err(|e| invalid(&format!("troves[{}].address", i), e))?;
                Ok(MonitoredTrove::new(trove.name.clone(), address))
            })
            .collect()
    }

    /// Settings for the monitoring run
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        Ok(MonitorConfig {
            tcr_threshold: self.monitor.tcr_threshold,
            trove_cr_threshold: self.monitor.trove_cr_threshold,
            monitored_troves: self.monitored_troves()?,
            price_timeout: Duration::from_millis(self.monitor.price_timeout_ms),
            record_price: self.monitor.record_price,
        })
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn check_threshold(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(key, DomainError::InvalidThreshold(value)));
    }
    Ok(())
}

fn invalid(key: &str, error: DomainError) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.tcr_threshold, 2.0);
        assert_eq!(config.monitor.trove_cr_threshold, 1.5);
        assert_eq!(config.monitor.hysteresis, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_troves_are_valid() {
        let config = Config::default();
        let troves = config.monitored_troves().unwrap();
        assert_eq!(troves.len(), 3);
        assert_eq!(troves[0].name, "Risky Trove #1");
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = Config::default();
        config.monitor.tcr_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "monitor.tcr_threshold"
        ));

        let mut config = Config::default();
        config.monitor.trove_cr_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_hysteresis() {
        let mut config = Config::default();
        config.monitor.hysteresis = -0.1;
        assert!(config.validate().is_err());

        config.monitor.hysteresis = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = Config::default();
        config.monitor.interval_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "monitor.interval_seconds"
        ));

        let mut config = Config::default();
        config.monitor.retry_interval_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "monitor.retry_interval_seconds"
        ));
    }

    #[test]
    fn test_invalid_trove_address() {
        let config = Config {
            troves: vec![TroveConfig::new("bad", "0x1234")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "troves[0].address"
        ));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [monitor]
            tcr_threshold = 1.8

            [[troves]]
            name = "Mine"
            address = "0xe360934C02B4D0f0de602ea09a4ddE73287E603F"

            [data_source]
            snapshot_path = "/tmp/snapshot.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.tcr_threshold, 1.8);
        assert_eq!(config.monitor.trove_cr_threshold, 1.5);
        assert_eq!(config.troves.len(), 1);
        assert!(config.notifications.terminal);
        assert_eq!(
            config.data_source.snapshot_path,
            Some(PathBuf::from("/tmp/snapshot.json"))
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let parsed: Config = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.troves, config.troves);
        assert_eq!(parsed.monitor.tcr_threshold, config.monitor.tcr_threshold);
    }

    #[test]
    fn test_monitor_config() {
        let mut config = Config::default();
        config.monitor.price_timeout_ms = 2500;
        config.monitor.record_price = true;
        let monitor = config.monitor_config().unwrap();
        assert_eq!(monitor.price_timeout, Duration::from_millis(2500));
        assert!(monitor.record_price);
    }
}
