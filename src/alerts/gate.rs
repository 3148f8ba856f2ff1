//! Notification gate
//!
//! Decides whether a threshold crossing should produce a real alert or be
//! suppressed as a repeat. State lives in [`Storage`], one key per subject:
//!
//! - no value: no active alert
//! - a [`CrNotificationRecord`]: an alert fired and the ratio has not recovered
//! - the closure marker: the trove's closure has been notified
//!
//! An alert fires once per crossing and re-arms only after the ratio climbs
//! above `threshold * (1 + hysteresis)`. With a 180% threshold and the default
//! 5% band, the next alert needs a recovery to 189% first.

use super::types::{
    CrNotificationParams, StoredNotification, TroveClosureNotificationParams,
    TroveCrNotificationParams,
};
use crate::domain::subject::{trove_storage_key, TCR_KEY};
use crate::error::StorageError;
use crate::storage::Storage;
use std::sync::Arc;

/// Default recovery band above the threshold
pub const DEFAULT_HYSTERESIS: f64 = 0.05;

/// Hysteresis state machine over persisted notification state
#[derive(Clone)]
pub struct NotificationGate {
    storage: Arc<dyn Storage>,
    hysteresis: f64,
}

impl NotificationGate {
    /// Create a gate with the default hysteresis
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            hysteresis: DEFAULT_HYSTERESIS,
        }
    }

    /// Override the recovery band
    pub fn with_hysteresis(mut self, hysteresis: f64) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Configured recovery band
    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }

    /// Current state at `key`
    ///
    /// Malformed values are logged and read as [`StoredNotification::Absent`].
    pub async fn state(&self, key: &str) -> Result<StoredNotification, StorageError> {
        let raw = self.storage.get(key).await?;
        Ok(StoredNotification::decode(&raw).unwrap_or_else(|raw| {
            log::warn!(
                "Ignoring malformed notification state at {}: {}",
                key,
                raw
            );
            StoredNotification::Absent
        }))
    }

    /// Remove any state at `key`
    pub async fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.storage.delete(key).await
    }

    async fn store(&self, key: &str, state: &StoredNotification) -> Result<(), StorageError> {
        match state.encode()? {
            Some(value) => self.storage.put(key, &value).await,
            None => self.storage.delete(key).await,
        }
    }

    /// Generic CR evaluation for the subject owning `key`
    pub async fn should_notify_cr(
        &self,
        key: &str,
        params: &CrNotificationParams,
    ) -> Result<bool, StorageError> {
        let state = self.state(key).await?;
        self.decide_cr(key, state, params).await
    }

    async fn decide_cr(
        &self,
        key: &str,
        state: StoredNotification,
        params: &CrNotificationParams,
    ) -> Result<bool, StorageError> {
        // Exact comparison: a different configured threshold starts a new cycle
        if let StoredNotification::Alert(last) = &state {
            if last.threshold == params.threshold {
                if params.current > params.threshold * (1.0 + self.hysteresis) {
                    log::debug!(
                        "{}: recovered to {} (threshold {}), re-arming",
                        key,
                        params.current,
                        params.threshold
                    );
                    self.store(key, &StoredNotification::Absent).await?;
                } else {
                    log::debug!("{}: already alerted, still at {}", key, params.current);
                }
                return Ok(false);
            }
            log::debug!(
                "{}: ignoring stale alert for threshold {}",
                key,
                last.threshold
            );
        }

        if params.current > params.threshold {
            return Ok(false);
        }

        self.store(key, &StoredNotification::Alert(params.clone()))
            .await?;
        Ok(true)
    }

    /// Evaluate the protocol TCR
    pub async fn should_notify_tcr(
        &self,
        params: &CrNotificationParams,
    ) -> Result<bool, StorageError> {
        self.should_notify_cr(TCR_KEY, params).await
    }

    /// Evaluate a trove's CR
    ///
    /// A closure marker found here is removed first; see
    /// [`NotificationGate::reopen_closed_trove`].
    pub async fn should_notify_trove_cr(
        &self,
        params: &TroveCrNotificationParams,
    ) -> Result<bool, StorageError> {
        let key = trove_storage_key(&params.address);
        let mut state = self.state(&key).await?;

        if state == StoredNotification::Closed {
            self.reopen_closed_trove(&key).await?;
            state = StoredNotification::Absent;
        }

        self.decide_cr(&key, state, &params.cr).await
    }

    /// Drop the closure marker of a trove that shows a position again
    ///
    /// Called whenever a CR check meets a closed trove, so a trove reopened
    /// at the same address re-enters alerting.
    pub async fn reopen_closed_trove(&self, key: &str) -> Result<(), StorageError> {
        log::info!("{}: closed trove has a position again, clearing closure", key);
        self.store(key, &StoredNotification::Absent).await
    }

    /// Evaluate a trove closure; fires once per address
    pub async fn should_notify_trove_closure(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<bool, StorageError> {
        let key = trove_storage_key(&params.address);

        if self.state(&key).await? == StoredNotification::Closed {
            return Ok(false);
        }

        self.store(&key, &StoredNotification::Closed).await?;
        Ok(true)
    }
}
