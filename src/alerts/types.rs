//! Notification domain types
//!
//! Parameters handed to notification targets and the persisted per-subject
//! notification state.

use crate::domain::{Address, ClosedStatus, PriceDatum};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal stored at a trove key once its closure has been notified
pub const CLOSED_MARKER: &str = "closed";

/// Collateral ratio crossing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrNotificationParams {
    /// Configured threshold ratio
    pub threshold: f64,
    /// Current ratio
    pub current: f64,
    /// Price the ratio was computed with
    pub price: PriceDatum,
}

/// Persisted "last fired alert" state of a subject
pub type CrNotificationRecord = CrNotificationParams;

/// Trove collateral ratio crossing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroveCrNotificationParams {
    /// Trove name
    pub name: String,
    /// Trove owner address
    pub address: Address,
    /// Ratio, threshold and price
    #[serde(flatten)]
    pub cr: CrNotificationParams,
}

/// Trove closure parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroveClosureNotificationParams {
    /// Trove name
    pub name: String,
    /// Trove owner address
    pub address: Address,
    /// Price at the time the closure was seen
    pub price: PriceDatum,
    /// How the trove was closed
    pub status: ClosedStatus,
}

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Protocol TCR fell to or below its threshold
    Tcr,
    /// A trove's CR fell to or below its threshold
    TroveCr,
    /// A trove closed
    TroveClosure,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcr => write!(f, "TCR"),
            Self::TroveCr => write!(f, "TROVE CR"),
            Self::TroveClosure => write!(f, "TROVE CLOSED"),
        }
    }
}

/// A notification ready for delivery
#[derive(Debug, Clone, Copy)]
pub enum Notification<'a> {
    Tcr(&'a CrNotificationParams),
    TroveCr(&'a TroveCrNotificationParams),
    TroveClosure(&'a TroveClosureNotificationParams),
}

impl Notification<'_> {
    /// Notification kind
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Tcr(_) => NotificationKind::Tcr,
            Self::TroveCr(_) => NotificationKind::TroveCr,
            Self::TroveClosure(_) => NotificationKind::TroveClosure,
        }
    }

    /// Name of the subject, for logs and failure reports
    pub fn subject(&self) -> &str {
        match self {
            Self::Tcr(_) => "TCR",
            Self::TroveCr(p) => &p.name,
            Self::TroveClosure(p) => &p.name,
        }
    }
}

/// Persisted notification state of a subject
///
/// Decoded from the raw storage string; the alert state machine works only
/// on this type.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredNotification {
    /// No active alert
    Absent,
    /// An alert fired and has not recovered yet
    Alert(CrNotificationRecord),
    /// The trove's closure has been notified
    Closed,
}

impl StoredNotification {
    /// Decode a raw storage value
    ///
    /// Values that are neither a record nor the closure marker are
    /// reported as `Err` with the offending text.
    pub fn decode(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Ok(Self::Absent);
        }

        let value: serde_json::Value = serde_json::from_str(raw).map_err(|_| raw.to_string())?;

        match value {
            serde_json::Value::Null => Ok(Self::Absent),
            serde_json::Value::String(s) if s == CLOSED_MARKER => Ok(Self::Closed),
            value @ serde_json::Value::Object(_) => serde_json::from_value(value)
                .map(Self::Alert)
                .map_err(|_| raw.to_string()),
            _ => Err(raw.to_string()),
        }
    }

    /// Encode for storage; `None` means the key should be deleted
    pub fn encode(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::Absent => Ok(None),
            Self::Alert(record) => serde_json::to_string(record).map(Some),
            Self::Closed => serde_json::to_string(CLOSED_MARKER).map(Some),
        }
    }
}

impl fmt::Display for StoredNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "no alert"),
            Self::Alert(record) => write!(
                f,
                "alert active (threshold {}, last {}, price {})",
                record.threshold, record.current, record.price
            ),
            Self::Closed => write!(f, "closed"),
        }
    }
}
