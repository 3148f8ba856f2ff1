//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::{dollars, percent, StoredNotification};
use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::services::{RunSummary, SubjectOutcome};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

fn ratio_cell(ratio: Option<f64>) -> String {
    ratio.map(percent).unwrap_or_else(|| "-".to_string())
}

impl TableDisplay for SubjectOutcome {
    fn to_table(&self) -> String {
        let kind = self
            .kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "SKIPPED".to_string());
        let marker = if self.fired { "  ALERT" } else { "" };
        format!(
            "{:<20} {:<14} {:>8}{}",
            self.subject,
            kind,
            ratio_cell(self.ratio),
            marker
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "{}={}{}",
            self.subject,
            ratio_cell(self.ratio),
            if self.fired { "!" } else { "" }
        )
    }
}

impl TableDisplay for RunSummary {
    fn to_table(&self) -> String {
        let mut output = format!(
            "Price: {} (source: {})\n",
            dollars(self.price.value),
            self.price.source
        );
        output.push_str(&format!("{:<20} {:<14} {:>8}\n", "SUBJECT", "KIND", "RATIO"));

        for subject in &self.subjects {
            output.push_str(&subject.to_table());
            output.push('\n');
        }

        output.push_str(&format!("{} alert(s) fired", self.fired()));
        output
    }

    fn to_compact(&self) -> String {
        let subjects = self
            .subjects
            .iter()
            .map(|s| s.to_compact())
            .collect::<Vec<_>>()
            .join(", ");
        format!("price={} {}", self.price.value, subjects)
    }
}

/// Remembered alert state of one subject
#[derive(Debug, Clone, Serialize)]
pub struct SubjectStatus {
    pub subject: String,
    pub key: String,
    pub state: String,
    pub threshold: Option<f64>,
    pub last_ratio: Option<f64>,
}

impl SubjectStatus {
    /// Describe `state` for `subject` stored under `key`
    pub fn new(subject: impl Into<String>, key: impl Into<String>, state: &StoredNotification) -> Self {
        let (label, threshold, last_ratio) = match state {
            StoredNotification::Absent => ("clear", None, None),
            StoredNotification::Alert(record) => {
                ("alerted", Some(record.threshold), Some(record.current))
            }
            StoredNotification::Closed => ("closed", None, None),
        };
        Self {
            subject: subject.into(),
            key: key.into(),
            state: label.to_string(),
            threshold,
            last_ratio: last_ratio.filter(|r| r.is_finite()),
        }
    }
}

impl TableDisplay for SubjectStatus {
    fn to_table(&self) -> String {
        let mut line = format!("{:<20} {:<8}", self.subject, self.state);
        if let (Some(threshold), Some(ratio)) = (self.threshold, self.last_ratio) {
            line.push_str(&format!(
                " {} (threshold {})",
                percent(ratio),
                percent(threshold)
            ));
        }
        line
    }

    fn to_compact(&self) -> String {
        format!("{}={}", self.subject, self.state)
    }
}

/// Remembered alert state of every subject
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub subjects: Vec<SubjectStatus>,
}

impl TableDisplay for StatusReport {
    fn to_table(&self) -> String {
        self.subjects
            .iter()
            .map(|s| s.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.subjects
            .iter()
            .map(|s| s.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TableDisplay for Config {
    fn to_table(&self) -> String {
        self.to_toml()
            .unwrap_or_else(|e| format!("# failed to render configuration: {}", e))
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{CrNotificationParams, NotificationKind};
    use crate::domain::PriceDatum;

    fn summary() -> RunSummary {
        RunSummary {
            price: PriceDatum::new("CoinGecko", 1834.5),
            subjects: vec![
                SubjectOutcome {
                    subject: "TCR".to_string(),
                    kind: Some(NotificationKind::Tcr),
                    ratio: Some(1.9),
                    fired: true,
                },
                SubjectOutcome {
                    subject: "Risky Trove #3".to_string(),
                    kind: None,
                    ratio: None,
                    fired: false,
                },
            ],
        }
    }

    #[test]
    fn test_run_summary_table() {
        let output = summary().to_table();
        assert!(output.starts_with("Price: $1,834.50 (source: CoinGecko)"));
        assert!(output.contains("190%  ALERT"));
        assert!(output.contains("SKIPPED"));
        assert!(output.ends_with("1 alert(s) fired"));
    }

    #[test]
    fn test_run_summary_compact() {
        assert_eq!(
            summary().to_compact(),
            "price=1834.5 TCR=190%!, Risky Trove #3=-"
        );
    }

    #[test]
    fn test_subject_status() {
        let state = StoredNotification::Alert(CrNotificationParams {
            threshold: 1.5,
            current: 1.45,
            price: PriceDatum::new("CoinGecko", 1500.0),
        });
        let status = SubjectStatus::new("Risky Trove #1", "notification/trove/0xabc", &state);
        assert_eq!(status.state, "alerted");
        assert!(status.to_table().contains("145% (threshold 150%)"));

        let status = SubjectStatus::new("TCR", "notification/tcr", &StoredNotification::Absent);
        assert_eq!(status.to_compact(), "TCR=clear");
    }

    #[test]
    fn test_message_display() {
        let msg = Message {
            message: "Operation completed".to_string(),
            success: true,
        };

        assert!(msg.to_table().starts_with('✓'));
    }
}
