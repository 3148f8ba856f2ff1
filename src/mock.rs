//! Mock implementations for testing
//!
//! Provides scripted price sources, recording notification targets and a
//! failing data source for unit testing without network access.

use crate::alerts::{
    CrNotificationParams, NotificationKind, NotificationTarget, TroveClosureNotificationParams,
    TroveCrNotificationParams,
};
use crate::chain::ChainDataSource;
use crate::domain::{Address, Position, TroveSnapshot};
use crate::error::{DataSourceError, NotifyError};
use crate::price::{with_timeout, PriceSource};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Price source returning a fixed answer
#[derive(Debug, Clone)]
pub struct MockPriceSource {
    value: Option<f64>,
}

impl MockPriceSource {
    /// Source that always answers `value`
    pub fn new(value: Option<f64>) -> Self {
        Self { value }
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_price(&self, _timeout: Option<Duration>) -> Option<f64> {
        self.value
    }
}

/// Price source that answers only after `delay`
#[derive(Debug, Clone)]
pub struct SlowPriceSource {
    value: f64,
    delay: Duration,
}

impl SlowPriceSource {
    /// Source answering `value` after `delay`
    pub fn new(value: f64, delay: Duration) -> Self {
        Self { value, delay }
    }
}

#[async_trait]
impl PriceSource for SlowPriceSource {
    async fn fetch_price(&self, timeout: Option<Duration>) -> Option<f64> {
        let fetch = async {
            tokio::time::sleep(self.delay).await;
            self.value
        };
        with_timeout(timeout, fetch).await.ok()
    }
}

/// Notification target that records what it receives
#[derive(Debug, Default)]
pub struct RecordingTarget {
    received: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingTarget {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received, in order, as (kind, subject name)
    pub fn received(&self) -> Vec<(NotificationKind, String)> {
        self.received.lock().unwrap().clone()
    }

    /// Number of notifications of `kind`
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    fn record(&self, kind: NotificationKind, subject: &str) {
        self.received
            .lock()
            .unwrap()
            .push((kind, subject.to_string()));
    }
}

#[async_trait]
impl NotificationTarget for RecordingTarget {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify_tcr(&self, _params: &CrNotificationParams) -> Result<(), NotifyError> {
        self.record(NotificationKind::Tcr, "TCR");
        Ok(())
    }

    async fn notify_trove_cr(&self, params: &TroveCrNotificationParams) -> Result<(), NotifyError> {
        self.record(NotificationKind::TroveCr, &params.name);
        Ok(())
    }

    async fn notify_trove_closure(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<(), NotifyError> {
        self.record(NotificationKind::TroveClosure, &params.name);
        Ok(())
    }
}

/// Notification target that always fails
#[derive(Debug)]
pub struct FailingTarget {
    name: String,
}

impl FailingTarget {
    /// Failing target called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn fail(&self) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(format!("{} is down", self.name)))
    }
}

#[async_trait]
impl NotificationTarget for FailingTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify_tcr(&self, _params: &CrNotificationParams) -> Result<(), NotifyError> {
        self.fail()
    }

    async fn notify_trove_cr(&self, _params: &TroveCrNotificationParams) -> Result<(), NotifyError> {
        self.fail()
    }

    async fn notify_trove_closure(
        &self,
        _params: &TroveClosureNotificationParams,
    ) -> Result<(), NotifyError> {
        self.fail()
    }
}

/// Data source whose every call fails
#[derive(Debug, Default)]
pub struct FailingDataSource;

impl FailingDataSource {
    /// Create a failing data source
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>() -> Result<T, DataSourceError> {
        Err(DataSourceError::Unavailable("RPC endpoint unreachable".to_string()))
    }
}

#[async_trait]
impl ChainDataSource for FailingDataSource {
    async fn get_total(&self) -> Result<Position, DataSourceError> {
        Self::unavailable()
    }

    async fn get_total_redistributed(&self) -> Result<Position, DataSourceError> {
        Self::unavailable()
    }

    async fn get_trove_before_redistribution(
        &self,
        _address: &Address,
    ) -> Result<TroveSnapshot, DataSourceError> {
        Self::unavailable()
    }

    async fn get_price(&self) -> Result<f64, DataSourceError> {
        Self::unavailable()
    }
}
