//! Alert and notification system
//!
//! Hysteresis-gated alerting with multiple notification targets.

mod format;
mod gate;
mod notifier;
mod slack;
mod types;

pub use format::{dollars, percent, AlertMessage, Field};
pub use gate::{NotificationGate, DEFAULT_HYSTERESIS};
pub use notifier::{DispatchReport, Dispatcher, NotificationTarget, TerminalTarget};
pub use slack::{SlackConfig, SlackTarget};
pub use types::{
    CrNotificationParams, CrNotificationRecord, Notification, NotificationKind,
    StoredNotification, TroveClosureNotificationParams, TroveCrNotificationParams, CLOSED_MARKER,
};
