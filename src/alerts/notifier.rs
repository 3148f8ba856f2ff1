//! Alert notification system
//!
//! Provides the notification target trait, the terminal target, and the
//! dispatcher that gates notifications and fans them out to every target.

use super::format::AlertMessage;
use super::gate::NotificationGate;
use super::types::{
    CrNotificationParams, Notification, NotificationKind, TroveClosureNotificationParams,
    TroveCrNotificationParams,
};
use crate::error::{DeliveryFailure, NotifyError, StorageError};
use async_trait::async_trait;
use futures::future::join_all;
use std::io::{self, Write};
use std::sync::Arc;

/// Notification channel trait
#[async_trait]
pub trait NotificationTarget: Send + Sync {
    /// Channel name for identification
    fn name(&self) -> &str;

    /// Protocol TCR crossed its threshold
    async fn notify_tcr(&self, params: &CrNotificationParams) -> Result<(), NotifyError>;

    /// A trove's CR crossed its threshold
    async fn notify_trove_cr(&self, params: &TroveCrNotificationParams) -> Result<(), NotifyError>;

    /// A trove closed
    async fn notify_trove_closure(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<(), NotifyError>;
}

async fn deliver(
    target: &dyn NotificationTarget,
    notification: Notification<'_>,
) -> Result<(), NotifyError> {
    match notification {
        Notification::Tcr(p) => target.notify_tcr(p).await,
        Notification::TroveCr(p) => target.notify_trove_cr(p).await,
        Notification::TroveClosure(p) => target.notify_trove_closure(p).await,
    }
}

/// Terminal/console notifier
///
/// Outputs alerts to stdout/stderr with colored formatting
pub struct TerminalTarget {
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl TerminalTarget {
    /// Create a new terminal notifier
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    /// Check if terminal supports colors
    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    /// Format a notification as one header line plus indented fields
    fn format_notification(&self, notification: &Notification<'_>) -> String {
        let message = AlertMessage::compose(notification);
        let mut out = format!(
            "{} {}",
            self.format_kind(notification.kind()),
            message.title
        );
        for field in &message.fields {
            out.push_str(&format!("\n    {}: {}", field.label, field.value));
        }
        out
    }

    /// Format kind with colors
    fn format_kind(&self, kind: NotificationKind) -> String {
        if !self.use_colors {
            return format!("[{}]", kind);
        }

        let color_code = match kind {
            NotificationKind::Tcr => "\x1b[33m",                // Yellow
            NotificationKind::TroveCr => "\x1b[31m",            // Red
            NotificationKind::TroveClosure => "\x1b[35m\x1b[1m", // Bold Magenta
        };

        format!("{}[{}]\x1b[0m", color_code, kind)
    }

    fn write(&self, notification: Notification<'_>) -> Result<(), NotifyError> {
        let message = self.format_notification(&notification);

        if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", message)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }
}

impl Default for TerminalTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTarget for TerminalTarget {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn notify_tcr(&self, params: &CrNotificationParams) -> Result<(), NotifyError> {
        self.write(Notification::Tcr(params))
    }

    async fn notify_trove_cr(&self, params: &TroveCrNotificationParams) -> Result<(), NotifyError> {
        self.write(Notification::TroveCr(params))
    }

    async fn notify_trove_closure(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<(), NotifyError> {
        self.write(Notification::TroveClosure(params))
    }
}

/// Outcome of one dispatch
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// The gate approved the notification
    pub fired: bool,
    /// Targets that failed to deliver it
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchReport {
    /// Number of targets that received the notification
    pub fn delivered(&self, targets: usize) -> usize {
        if self.fired {
            targets - self.failures.len()
        } else {
            0
        }
    }
}

/// Gates notifications and delivers approved ones to every target
///
/// Deliveries run concurrently and each target's failure is recorded
/// independently; one failing target never cancels the others.
#[derive(Clone)]
pub struct Dispatcher {
    gate: NotificationGate,
    targets: Vec<Arc<dyn NotificationTarget>>,
}

impl Dispatcher {
    /// Create a dispatcher without targets
    pub fn new(gate: NotificationGate) -> Self {
        Self {
            gate,
            targets: Vec::new(),
        }
    }

    /// Add a target
    pub fn add_target(&mut self, target: Arc<dyn NotificationTarget>) {
        self.targets.push(target);
    }

    /// Builder form of [`Dispatcher::add_target`]
    pub fn with_target(mut self, target: Arc<dyn NotificationTarget>) -> Self {
        self.add_target(target);
        self
    }

    /// Get number of registered targets
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// The gate deciding what fires
    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    /// Dispatch a TCR notification
    pub async fn tcr_notification(
        &self,
        params: &CrNotificationParams,
    ) -> Result<DispatchReport, StorageError> {
        let fired = self.gate.should_notify_tcr(params).await?;
        Ok(self.fan_out(fired, Notification::Tcr(params)).await)
    }

    /// Dispatch a trove CR notification
    pub async fn trove_cr_notification(
        &self,
        params: &TroveCrNotificationParams,
    ) -> Result<DispatchReport, StorageError> {
        let fired = self.gate.should_notify_trove_cr(params).await?;
        Ok(self.fan_out(fired, Notification::TroveCr(params)).await)
    }

    /// Dispatch a trove closure notification
    pub async fn trove_closure_notification(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<DispatchReport, StorageError> {
        let fired = self.gate.should_notify_trove_closure(params).await?;
        Ok(self.fan_out(fired, Notification::TroveClosure(params)).await)
    }

    async fn fan_out(&self, fired: bool, notification: Notification<'_>) -> DispatchReport {
        if !fired {
            log::debug!("{}: {} suppressed", notification.subject(), notification.kind());
            return DispatchReport::default();
        }

        log::info!(
            "{}: {} alert fired, notifying {} target(s)",
            notification.subject(),
            notification.kind(),
            self.targets.len()
        );

        let results = join_all(self.targets.iter().map(|target| async move {
            (target.name(), deliver(target.as_ref(), notification).await)
        }))
        .await;

        let failures = results
            .into_iter()
            .filter_map(|(name, result)| {
                result.err().map(|error| {
                    log::warn!(
                        "Failed to notify via {} for {}: {}",
                        name,
                        notification.subject(),
                        error
                    );
                    DeliveryFailure {
                        target: name.to_string(),
                        subject: notification.subject().to_string(),
                        error,
                    }
                })
            })
            .collect();

        DispatchReport {
            fired: true,
            failures,
        }
    }
}
