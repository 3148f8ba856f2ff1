//! Check and watch command implementation
//!
//! Wires configuration into a [`Monitor`] and runs it once or on an interval.

use super::{base_config, open_state};
use crate::alerts::{Dispatcher, SlackConfig, SlackTarget, TerminalTarget};
use crate::chain::{ChainDataSource, SnapshotDataSource};
use crate::cli::args::{CheckArgs, OutputFormat, WatchArgs};
use crate::cli::output::{print_output, Message};
use crate::config::{Config, ConfigBuilder};
use crate::error::{ConfigError, Result};
use crate::price::{CoinGeckoSource, PriceFeedSource, PriceSources};
use crate::services::{Monitor, WatchConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Source name of the CoinGecko quote
pub const COINGECKO_SOURCE: &str = "CoinGecko";

/// Source name of the protocol price feed quote
pub const PRICE_FEED_SOURCE: &str = "Liquity PriceFeed";

fn with_check_args(builder: ConfigBuilder, args: &CheckArgs) -> ConfigBuilder {
    builder
        .with_snapshot(args.snapshot.clone())
        .with_tcr_threshold(args.tcr_threshold)
        .with_trove_cr_threshold(args.trove_cr_threshold)
}

/// Execute the check command
pub async fn run_check(
    args: &CheckArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    state: Option<PathBuf>,
) -> Result<()> {
    let config = with_check_args(base_config(config_path, state)?, args).build()?;
    let monitor = build_monitor(&config)?;

    let summary = monitor.check().await?;
    print_output(&summary, format)?;
    Ok(())
}

/// Execute the watch command
pub async fn run_watch(
    args: &WatchArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    state: Option<PathBuf>,
) -> Result<()> {
    let config = with_check_args(base_config(config_path, state)?, &args.check)
        .with_interval(args.interval)
        .with_retry_interval(args.retry_interval)
        .build()?;
    let monitor = build_monitor(&config)?;

    let watch = WatchConfig {
        interval: Duration::from_secs(config.monitor.interval_seconds),
        single_use: args.single_use,
        retry: config.monitor.retry && !args.no_retry,
        retry_interval: Duration::from_secs(config.monitor.retry_interval_seconds),
    };

    log::info!("Starting monitor");
    log::info!("  Interval: {:?}", watch.interval);
    log::info!("  Single use: {}", watch.single_use);
    log::info!("  Troves: {}", monitor.config().monitored_troves.len());

    monitor.watch(&watch).await?;

    if watch.single_use {
        let msg = Message {
            message: "Monitoring run completed (single-use mode)".to_string(),
            success: true,
        };
        print_output(&msg, format)?;
    }

    Ok(())
}

/// Assemble a monitor from configuration
pub fn build_monitor(config: &Config) -> Result<Monitor> {
    let snapshot_path = config
        .data_source
        .snapshot_path
        .as_ref()
        .ok_or_else(|| ConfigError::MissingField("data_source.snapshot_path".to_string()))?;
    let data_source: Arc<dyn ChainDataSource> = Arc::new(SnapshotDataSource::load(snapshot_path)?);

    let price_sources = price_sources(config, &data_source)?;
    let (storage, gate) = open_state(config);

    let mut dispatcher = Dispatcher::new(gate);
    if config.notifications.terminal {
        dispatcher.add_target(Arc::new(TerminalTarget::new()));
    }
    if let Some(url) = &config.notifications.slack_webhook_url {
        dispatcher.add_target(Arc::new(SlackTarget::new(SlackConfig::new(url.clone()))));
    }
    if dispatcher.target_count() == 0 {
        log::warn!("No notification targets enabled; alerts will only be recorded");
    }

    Ok(Monitor::new(
        config.monitor_config()?,
        data_source,
        price_sources,
        dispatcher,
        storage,
    ))
}

fn price_sources(config: &Config, data_source: &Arc<dyn ChainDataSource>) -> Result<PriceSources> {
    let mut sources = PriceSources::new();

    if config.price_sources.coingecko {
        let source = match &config.price_sources.coingecko_url {
            Some(url) => CoinGeckoSource::with_url(url.clone()),
            None => CoinGeckoSource::new(),
        };
        sources.add(COINGECKO_SOURCE, Box::new(source));
    }
    if config.price_sources.price_feed {
        sources.add(
            PRICE_FEED_SOURCE,
            Box::new(PriceFeedSource::new(data_source.clone())),
        );
    }

    if sources.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "price_sources".to_string(),
            message: "at least one price source must be enabled".to_string(),
        }
        .into());
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainSnapshot;
    use crate::domain::Position;
    use crate::error::AppError;

    fn offline_config(dir: &std::path::Path) -> Config {
        let snapshot = ChainSnapshot {
            price: 2000.0,
            total: Position::new(1250.0, 1_000_000.0),
            ..Default::default()
        };
        let snapshot_path = dir.join("chain.json");
        std::fs::write(&snapshot_path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let mut config = Config::default();
        config.data_source.snapshot_path = Some(snapshot_path);
        config.storage.path = dir.join("state.json");
        config.price_sources.coingecko = false;
        config.notifications.terminal = false;
        config
    }

    #[test]
    fn test_missing_snapshot_path() {
        let config = Config::default();
        assert!(matches!(
            build_monitor(&config),
            Err(AppError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[test]
    fn test_no_price_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.price_sources.price_feed = false;
        assert!(matches!(
            build_monitor(&config),
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn test_offline_check_uses_price_feed() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let monitor = build_monitor(&config).unwrap();

        let summary = monitor.check().await.unwrap();
        assert_eq!(summary.price.source, PRICE_FEED_SOURCE);
        assert_eq!(summary.price.value, 2000.0);
        // Default troves are absent from the snapshot and get skipped
        assert_eq!(summary.subjects.len(), 4);
        assert_eq!(summary.fired(), 0);
    }

    #[tokio::test]
    async fn test_alert_state_persists_across_monitors() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.monitor.tcr_threshold = 3.0;

        let first = build_monitor(&config).unwrap().check().await.unwrap();
        assert_eq!(first.fired(), 1);

        let second = build_monitor(&config).unwrap().check().await.unwrap();
        assert_eq!(second.fired(), 0);
    }

    #[tokio::test]
    async fn test_monitor_follows_rewritten_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let monitor = build_monitor(&config).unwrap();

        let first = monitor.check().await.unwrap();
        assert_eq!(first.fired(), 0);

        // Price drops to 400: TCR 50%
        let crashed = ChainSnapshot {
            price: 400.0,
            total: Position::new(1250.0, 1_000_000.0),
            ..Default::default()
        };
        std::fs::write(
            dir.path().join("chain.json"),
            serde_json::to_string(&crashed).unwrap(),
        )
        .unwrap();

        let second = monitor.check().await.unwrap();
        assert_eq!(second.price.value, 400.0);
        assert_eq!(second.fired(), 1);
        assert_eq!(second.subjects[0].ratio, Some(0.5));
    }
}
