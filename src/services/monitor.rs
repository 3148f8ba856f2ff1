//! Monitoring run
//!
//! One run fetches a consistent snapshot of price, protocol totals and every
//! monitored trove concurrently, then evaluates and dispatches each subject in
//! declared order: the TCR first, then troves in configuration order.

use crate::alerts::{
    CrNotificationParams, DispatchReport, Dispatcher, NotificationKind,
    TroveClosureNotificationParams, TroveCrNotificationParams,
};
use crate::chain::ChainDataSource;
use crate::domain::{MonitoredTrove, PriceDatum, Trove};
use crate::error::{AppError, DeliveryFailure, Result, StorageError};
use crate::price::{lowest_price, PriceSources, DEFAULT_PRICE_TIMEOUT};
use crate::storage::Storage;
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Storage key of the latest-price audit entry
pub const LATEST_PRICE_KEY: &str = "price/latest";

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Protocol TCR alert threshold
    pub tcr_threshold: f64,
    /// Per-trove CR alert threshold
    pub trove_cr_threshold: f64,
    /// Troves to watch, in evaluation order
    pub monitored_troves: Vec<MonitoredTrove>,
    /// Timeout shared by all price sources
    pub price_timeout: Duration,
    /// Store the winning price under [`LATEST_PRICE_KEY`] each run
    pub record_price: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tcr_threshold: 2.0,
            trove_cr_threshold: 1.5,
            monitored_troves: Vec::new(),
            price_timeout: DEFAULT_PRICE_TIMEOUT,
            record_price: false,
        }
    }
}

/// Configuration for repeated runs
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Interval between runs
    pub interval: Duration,
    /// Whether to exit after one run
    pub single_use: bool,
    /// Whether to retry on errors
    pub retry: bool,
    /// Interval between retries
    pub retry_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            single_use: false,
            retry: true,
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// What happened to one subject during a run
#[derive(Debug, Clone, Serialize)]
pub struct SubjectOutcome {
    /// Subject name ("TCR" or the trove name)
    pub subject: String,
    /// Notification kind evaluated, if any
    pub kind: Option<NotificationKind>,
    /// Ratio evaluated; `None` for empty troves and for infinite ratios
    pub ratio: Option<f64>,
    /// Whether an alert fired
    pub fired: bool,
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Price used for every ratio
    pub price: PriceDatum,
    /// Per-subject outcomes in evaluation order
    pub subjects: Vec<SubjectOutcome>,
}

impl RunSummary {
    /// Number of alerts fired
    pub fn fired(&self) -> usize {
        self.subjects.iter().filter(|s| s.fired).count()
    }
}

/// Risk monitor
pub struct Monitor {
    config: MonitorConfig,
    data_source: Arc<dyn ChainDataSource>,
    price_sources: PriceSources,
    dispatcher: Dispatcher,
    storage: Arc<dyn Storage>,
}

impl Monitor {
    /// Create a new monitor
    pub fn new(
        config: MonitorConfig,
        data_source: Arc<dyn ChainDataSource>,
        price_sources: PriceSources,
        dispatcher: Dispatcher,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            config,
            data_source,
            price_sources,
            dispatcher,
            storage,
        }
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Execute one monitoring run
    ///
    /// Any fetch failure aborts the run before anything is dispatched. Delivery
    /// failures do not stop later subjects; they are reported together as
    /// [`AppError::Delivery`] once every subject has been processed.
    pub async fn check(&self) -> Result<RunSummary> {
        let data_source = &self.data_source;

        let troves = try_join_all(self.config.monitored_troves.iter().map(|trove| async move {
            data_source
                .get_trove_before_redistribution(&trove.address)
                .await
                .map(|snapshot| (trove, snapshot))
        }));

        let (price, total, total_redistributed, troves) = tokio::try_join!(
            async {
                lowest_price(&self.price_sources, Some(self.config.price_timeout))
                    .await
                    .map_err(AppError::from)
            },
            async { data_source.get_total().await.map_err(AppError::from) },
            async {
                data_source
                    .get_total_redistributed()
                    .await
                    .map_err(AppError::from)
            },
            async { troves.await.map_err(AppError::from) },
        )?;

        if self.config.record_price {
            let encoded = serde_json::to_string(&price).map_err(StorageError::from)?;
            self.storage.put(LATEST_PRICE_KEY, &encoded).await?;
        }

        let mut subjects = Vec::with_capacity(troves.len() + 1);
        let mut failures: Vec<DeliveryFailure> = Vec::new();

        let tcr = CrNotificationParams {
            threshold: self.config.tcr_threshold,
            current: total.collateral_ratio(price.value),
            price: price.clone(),
        };
        log::debug!("TCR {} (threshold {})", tcr.current, tcr.threshold);
        let report = self.dispatcher.tcr_notification(&tcr).await?;
        subjects.push(outcome("TCR", NotificationKind::Tcr, Some(tcr.current), &report));
        failures.extend(report.failures);

        for (monitored, snapshot) in troves {
            let trove = snapshot.apply_redistribution(&total_redistributed);
            if let Some((outcome, report)) = self.evaluate_trove(monitored, &trove, &price).await? {
                subjects.push(outcome);
                failures.extend(report.failures);
            } else {
                subjects.push(SubjectOutcome {
                    subject: monitored.name.clone(),
                    kind: None,
                    ratio: None,
                    fired: false,
                });
            }
        }

        let summary = RunSummary { price, subjects };
        log::info!(
            "Run complete: {} subject(s), {} alert(s) fired",
            summary.subjects.len(),
            summary.fired()
        );

        if !failures.is_empty() {
            return Err(AppError::Delivery(failures));
        }
        Ok(summary)
    }

    /// Dispatch the notification matching a trove's state, if any
    async fn evaluate_trove(
        &self,
        monitored: &MonitoredTrove,
        trove: &Trove,
        price: &PriceDatum,
    ) -> Result<Option<(SubjectOutcome, DispatchReport)>> {
        if !trove.is_empty() {
            let params = TroveCrNotificationParams {
                name: monitored.name.clone(),
                address: monitored.address.clone(),
                cr: CrNotificationParams {
                    threshold: self.config.trove_cr_threshold,
                    current: trove.collateral_ratio(price.value),
                    price: price.clone(),
                },
            };
            log::debug!(
                "{}: CR {} (threshold {})",
                monitored.name,
                params.cr.current,
                params.cr.threshold
            );
            let report = self.dispatcher.trove_cr_notification(&params).await?;
            return Ok(Some((
                outcome(&monitored.name, NotificationKind::TroveCr, Some(params.cr.current), &report),
                report,
            )));
        }

        let Some(status) = trove.status.closed() else {
            log::debug!("{}: empty trove with status {}", monitored.name, trove.status);
            return Ok(None);
        };

        let params = TroveClosureNotificationParams {
            name: monitored.name.clone(),
            address: monitored.address.clone(),
            price: price.clone(),
            status,
        };
        let report = self.dispatcher.trove_closure_notification(&params).await?;
        Ok(Some((
            outcome(&monitored.name, NotificationKind::TroveClosure, None, &report),
            report,
        )))
    }

    /// Run checks repeatedly
    pub async fn watch(&self, config: &WatchConfig) -> Result<()> {
        loop {
            if let Err(e) = self.check().await {
                log::error!("Monitoring run failed: {}", e);
                // A single-use run reports its own failure
                if !config.retry || config.single_use {
                    return Err(e);
                }
                log::info!("Retrying in {:?}...", config.retry_interval);
                tokio::time::sleep(config.retry_interval).await;
                continue;
            }

            if config.single_use {
                log::info!("Single-use mode: exiting after one run");
                break;
            }

            tokio::time::sleep(config.interval).await;
        }

        Ok(())
    }
}

fn outcome(
    subject: &str,
    kind: NotificationKind,
    ratio: Option<f64>,
    report: &DispatchReport,
) -> SubjectOutcome {
    SubjectOutcome {
        subject: subject.to_string(),
        kind: Some(kind),
        ratio: ratio.filter(|r| r.is_finite()),
        fired: report.fired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{NotificationGate, NotificationTarget, StoredNotification};
    use crate::chain::{ChainSnapshot, SnapshotDataSource};
    use crate::domain::{Address, Position, TroveSnapshot, TroveStatus};
    use crate::error::PriceError;
    use crate::mock::{FailingDataSource, FailingTarget, MockPriceSource, RecordingTarget};
    use crate::storage::MemoryStorage;

    const TROVE_1: &str = "0xe360934C02B4D0f0de602ea09a4ddE73287E603F";
    const TROVE_2: &str = "0xb884F2Fe0d515c82D07C4E9b1E9f75064D079B2b";

    fn address(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn open_trove(collateral: f64, debt: f64) -> TroveSnapshot {
        TroveSnapshot {
            position: Position::new(collateral, debt),
            stake: collateral,
            snapshot_of_total_redistributed: Position::default(),
            status: TroveStatus::Open,
        }
    }

    fn closed_trove(status: TroveStatus) -> TroveSnapshot {
        TroveSnapshot {
            status,
            ..TroveSnapshot::non_existent()
        }
    }

    /// Protocol at TCR 2.5 with the price at 2000
    fn snapshot() -> ChainSnapshot {
        ChainSnapshot {
            price: 2000.0,
            total: Position::new(1250.0, 1_000_000.0),
            ..Default::default()
        }
    }

    struct Harness {
        monitor: Monitor,
        recorder: Arc<RecordingTarget>,
        storage: Arc<MemoryStorage>,
    }

    fn harness(snapshot: ChainSnapshot, price: f64, troves: &[(&str, &str)]) -> Harness {
        harness_with(
            Arc::new(SnapshotDataSource::new(snapshot)),
            price,
            troves,
            Vec::new(),
        )
    }

    fn harness_with(
        data_source: Arc<dyn ChainDataSource>,
        price: f64,
        troves: &[(&str, &str)],
        extra_targets: Vec<Arc<dyn NotificationTarget>>,
    ) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let recorder = Arc::new(RecordingTarget::new());
        let mut dispatcher =
            Dispatcher::new(NotificationGate::new(storage.clone())).with_target(recorder.clone());
        for target in extra_targets {
            dispatcher.add_target(target);
        }

        let config = MonitorConfig {
            monitored_troves: troves
                .iter()
                .map(|(name, addr)| MonitoredTrove::new(*name, address(addr)))
                .collect(),
            ..Default::default()
        };

        let sources = PriceSources::new()
            .with("A", Box::new(MockPriceSource::new(Some(price + 50.0))))
            .with("B", Box::new(MockPriceSource::new(Some(price))));

        Harness {
            monitor: Monitor::new(config, data_source, sources, dispatcher, storage.clone()),
            recorder,
            storage,
        }
    }

    #[tokio::test]
    async fn test_healthy_run_fires_nothing() {
        let snapshot = snapshot().with_trove(address(TROVE_1), open_trove(10.0, 10_000.0));
        let h = harness(snapshot, 2000.0, &[("Risky Trove #1", TROVE_1)]);

        let summary = h.monitor.check().await.unwrap();

        assert_eq!(summary.price, PriceDatum::new("B", 2000.0));
        assert_eq!(summary.fired(), 0);
        assert_eq!(summary.subjects.len(), 2);
        assert_eq!(summary.subjects[0].ratio, Some(2.5));
        assert_eq!(summary.subjects[1].ratio, Some(2.0));
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn test_price_drop_alerts_once() {
        let snapshot = snapshot().with_trove(address(TROVE_1), open_trove(10.0, 10_000.0));
        // TCR 1.5, trove CR 1.2
        let h = harness(snapshot, 1200.0, &[("Risky Trove #1", TROVE_1)]);

        let summary = h.monitor.check().await.unwrap();
        assert_eq!(summary.fired(), 2);
        assert_eq!(
            h.recorder.received(),
            vec![
                (NotificationKind::Tcr, "TCR".to_string()),
                (NotificationKind::TroveCr, "Risky Trove #1".to_string()),
            ]
        );

        let summary = h.monitor.check().await.unwrap();
        assert_eq!(summary.fired(), 0);
        assert_eq!(h.recorder.received().len(), 2);
    }

    #[tokio::test]
    async fn test_redistribution_is_applied() {
        // Recorded CR at 2000 is 2.0, but pending debt pushes it below 1.5
        let trove = TroveSnapshot {
            position: Position::new(10.0, 10_000.0),
            stake: 10.0,
            snapshot_of_total_redistributed: Position::new(0.0, 0.0),
            status: TroveStatus::Open,
        };
        let mut snapshot = snapshot().with_trove(address(TROVE_1), trove);
        snapshot.total_redistributed = Position::new(0.1, 500.0);

        let h = harness(snapshot, 2000.0, &[("Risky Trove #1", TROVE_1)]);
        let summary = h.monitor.check().await.unwrap();

        // (10 + 1) * 2000 / (10000 + 5000)
        let ratio = summary.subjects[1].ratio.unwrap();
        assert!((ratio - 22_000.0 / 15_000.0).abs() < 1e-9);
        assert!(summary.subjects[1].fired);
    }

    #[tokio::test]
    async fn test_closed_trove_notifies_once() {
        let snapshot = snapshot()
            .with_trove(address(TROVE_1), closed_trove(TroveStatus::ClosedByLiquidation));
        let h = harness(snapshot, 2000.0, &[("Risky Trove #1", TROVE_1)]);

        let summary = h.monitor.check().await.unwrap();
        assert_eq!(summary.subjects[1].kind, Some(NotificationKind::TroveClosure));
        assert!(summary.subjects[1].fired);

        let summary = h.monitor.check().await.unwrap();
        assert!(!summary.subjects[1].fired);
        assert_eq!(h.recorder.count(NotificationKind::TroveClosure), 1);
    }

    #[tokio::test]
    async fn test_empty_non_closed_trove_is_skipped() {
        // Unknown address resolves to a nonExistent empty trove
        let h = harness(snapshot(), 2000.0, &[("Never opened", TROVE_2)]);

        let summary = h.monitor.check().await.unwrap();
        assert_eq!(summary.subjects[1].kind, None);
        assert!(h.recorder.received().is_empty());
    }

    #[tokio::test]
    async fn test_troves_processed_in_order() {
        let snapshot = snapshot()
            .with_trove(address(TROVE_1), open_trove(1.0, 2_000.0))
            .with_trove(address(TROVE_2), open_trove(1.0, 2_000.0));
        let h = harness(
            snapshot,
            1000.0,
            &[("Second", TROVE_2), ("First", TROVE_1)],
        );

        h.monitor.check().await.unwrap();
        let names: Vec<_> = h.recorder.received().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["TCR", "Second", "First"]);
    }

    #[tokio::test]
    async fn test_data_source_failure_aborts_run() {
        let h = harness_with(
            Arc::new(FailingDataSource::new()),
            1000.0,
            &[("Risky Trove #1", TROVE_1)],
            Vec::new(),
        );

        assert!(matches!(
            h.monitor.check().await,
            Err(AppError::DataSource(_))
        ));
        assert!(h.recorder.received().is_empty());
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn test_no_price_aborts_run() {
        let storage = Arc::new(MemoryStorage::new());
        let recorder = Arc::new(RecordingTarget::new());
        let monitor = Monitor::new(
            MonitorConfig::default(),
            Arc::new(SnapshotDataSource::new(snapshot())),
            PriceSources::new().with("A", Box::new(MockPriceSource::new(None))),
            Dispatcher::new(NotificationGate::new(storage.clone())).with_target(recorder.clone()),
            storage,
        );

        assert!(matches!(
            monitor.check().await,
            Err(AppError::Price(PriceError::NoPriceAvailable))
        ));
        assert!(recorder.received().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_reported_after_all_subjects() {
        let snapshot = snapshot().with_trove(address(TROVE_1), open_trove(10.0, 10_000.0));
        let h = harness_with(
            Arc::new(SnapshotDataSource::new(snapshot)),
            1200.0,
            &[("Risky Trove #1", TROVE_1)],
            vec![Arc::new(FailingTarget::new("webhook")) as Arc<dyn NotificationTarget>],
        );

        match h.monitor.check().await {
            Err(AppError::Delivery(failures)) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].subject, "TCR");
                assert_eq!(failures[1].subject, "Risky Trove #1");
            }
            other => panic!("Expected delivery failure, got {:?}", other),
        }

        // The working target still got both alerts
        assert_eq!(h.recorder.received().len(), 2);
    }

    #[tokio::test]
    async fn test_record_price() {
        let storage = Arc::new(MemoryStorage::new());
        let monitor = Monitor::new(
            MonitorConfig {
                record_price: true,
                ..Default::default()
            },
            Arc::new(SnapshotDataSource::new(snapshot())),
            PriceSources::new().with("B", Box::new(MockPriceSource::new(Some(2000.0)))),
            Dispatcher::new(NotificationGate::new(storage.clone())),
            storage.clone(),
        );

        monitor.check().await.unwrap();
        let stored: PriceDatum =
            serde_json::from_str(&storage.get(LATEST_PRICE_KEY).await.unwrap()).unwrap();
        assert_eq!(stored, PriceDatum::new("B", 2000.0));
    }

    #[tokio::test]
    async fn test_reopened_trove_clears_closure() {
        let storage = Arc::new(MemoryStorage::new());
        let gate = NotificationGate::new(storage.clone());
        let key = MonitoredTrove::new("t", address(TROVE_1)).storage_key();
        storage.put(&key, "\"closed\"").await.unwrap();

        let snapshot = snapshot().with_trove(address(TROVE_1), open_trove(10.0, 5_000.0));
        let monitor = Monitor::new(
            MonitorConfig {
                monitored_troves: vec![MonitoredTrove::new("t", address(TROVE_1))],
                ..Default::default()
            },
            Arc::new(SnapshotDataSource::new(snapshot)),
            PriceSources::new().with("B", Box::new(MockPriceSource::new(Some(2000.0)))),
            Dispatcher::new(gate.clone()),
            storage.clone(),
        );

        monitor.check().await.unwrap();
        assert_eq!(gate.state(&key).await.unwrap(), StoredNotification::Absent);
    }

    #[tokio::test]
    async fn test_watch_single_use() {
        let h = harness(snapshot(), 2000.0, &[]);
        let config = WatchConfig {
            single_use: true,
            ..Default::default()
        };
        assert!(h.monitor.watch(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_single_use_failure_is_reported() {
        let h = harness_with(Arc::new(FailingDataSource::new()), 1000.0, &[], Vec::new());
        let config = WatchConfig {
            single_use: true,
            retry: true,
            ..Default::default()
        };
        assert!(matches!(
            h.monitor.watch(&config).await,
            Err(AppError::DataSource(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_keeps_retrying_failed_runs() {
        // With retry on and no single-use, a failing run is retried, never returned
        let h = harness_with(Arc::new(FailingDataSource::new()), 1000.0, &[], Vec::new());
        let config = WatchConfig {
            retry_interval: Duration::from_secs(5),
            ..Default::default()
        };
        let outcome =
            tokio::time::timeout(Duration::from_secs(60), h.monitor.watch(&config)).await;
        assert!(outcome.is_err(), "watch should still be retrying");
    }

    #[tokio::test]
    async fn test_watch_without_retry_returns_error() {
        let h = harness_with(Arc::new(FailingDataSource::new()), 1000.0, &[], Vec::new());
        let config = WatchConfig {
            retry: false,
            ..Default::default()
        };
        assert!(h.monitor.watch(&config).await.is_err());
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.tcr_threshold, 2.0);
        assert_eq!(config.trove_cr_threshold, 1.5);
        assert_eq!(config.price_timeout, Duration::from_secs(10));
        assert!(!config.record_price);
    }
}
