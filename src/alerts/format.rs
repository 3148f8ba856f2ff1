//! Human-readable alert messages
//!
//! Targets share one message layout: a title and a list of labelled fields.
//! Each target decides how to render them (Slack mrkdwn, plain terminal text).

use super::types::Notification;
use crate::domain::{Address, PriceDatum};

/// Block explorer base URL for address links
pub const ETHERSCAN_ADDRESS_URL: &str = "https://etherscan.io/address/";

/// One labelled line of an alert body
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    /// Optional hyperlink for the value
    pub link: Option<String>,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            link: None,
        }
    }

    fn address(address: &Address) -> Self {
        Self {
            label: "Address",
            value: address.to_string(),
            link: Some(format!("{}{}", ETHERSCAN_ADDRESS_URL, address)),
        }
    }

    fn price(price: &PriceDatum) -> Self {
        Self::new(
            "Current price",
            format!("{} (source: {})", dollars(price.value), price.source),
        )
    }
}

/// Title and body of an alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub title: String,
    pub fields: Vec<Field>,
}

impl AlertMessage {
    /// Compose the message for a notification
    pub fn compose(notification: &Notification<'_>) -> Self {
        match notification {
            Notification::Tcr(p) => Self {
                title: "TCR threshold crossed".to_string(),
                fields: vec![
                    Field::new("Current TCR", percent(p.current)),
                    Field::new("Threshold", percent(p.threshold)),
                    Field::price(&p.price),
                ],
            },
            Notification::TroveCr(p) => Self {
                title: format!("Trove CR threshold crossed ({})", p.name),
                fields: vec![
                    Field::new("Name", p.name.clone()),
                    Field::address(&p.address),
                    Field::new("Current CR", percent(p.cr.current)),
                    Field::new("Threshold", percent(p.cr.threshold)),
                    Field::price(&p.cr.price),
                ],
            },
            Notification::TroveClosure(p) => Self {
                title: format!("Trove closed ({})", p.name),
                fields: vec![
                    Field::new("Name", p.name.clone()),
                    Field::address(&p.address),
                    Field::new("Closed by", p.status.closed_by()),
                    Field::price(&p.price),
                ],
            },
        }
    }

    /// Body as plain `Label: value` lines
    pub fn plain_body(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}: {}", f.label, f.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ratio as a percentage with one decimal, e.g. `1.8456` -> `184.6%`
pub fn percent(ratio: f64) -> String {
    if ratio.is_infinite() {
        return "∞".to_string();
    }
    let rounded = (1000.0 * ratio).round() / 10.0;
    format!("{}%", rounded)
}

/// USD amount with thousands separators and two decimals, e.g. `$1,834.50`
pub fn dollars(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
