//! Unified error types for trovemon
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Price aggregation failed
    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    /// Persistent storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chain data source failed
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    /// A single notification target failed
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// One or more notification deliveries failed during a run
    #[error("{} notification deliveries failed: {}", .0.len(), DeliveryFailures(.0))]
    Delivery(Vec<DeliveryFailure>),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Address is not `0x` followed by 40 hex digits
    #[error("Invalid address: {0} (expected 0x followed by 40 hex digits)")]
    InvalidAddress(String),

    /// Ratio threshold must be finite and positive
    #[error("Invalid threshold: {0} (must be a finite ratio greater than 0)")]
    InvalidThreshold(f64),

    /// Hysteresis band must be finite and non-negative
    #[error("Invalid hysteresis: {0} (must be a finite value >= 0)")]
    InvalidHysteresis(f64),

    /// Subject selector could not be parsed
    #[error("Invalid subject: {0} (expected 'tcr' or a trove address)")]
    InvalidSubject(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors from price aggregation and individual price sources
///
/// Only [`PriceError::NoPriceAvailable`] escapes the aggregator; the other
/// variants are logged by the source that hit them.
#[derive(Error, Debug)]
pub enum PriceError {
    /// No source returned a usable price
    #[error("Failed to get price from any source")]
    NoPriceAvailable,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with something we could not interpret
    #[error("Malformed response from {source_name}: {body}")]
    MalformedResponse { source_name: String, body: String },

    /// Source did not answer in time
    #[error("Timeout of {0:?} exceeded")]
    Timeout(Duration),
}

/// Errors from the key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying file access failed
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file does not hold a JSON object of strings
    #[error("Corrupt storage file {path}: {message}")]
    Corrupt { path: String, message: String },

    /// Value could not be encoded for storage
    #[error("Failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the chain data source
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Source could not be reached or read
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// Snapshot could not be decoded
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error reading a snapshot
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from notification targets
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Webhook request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing to the terminal failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Target refused the notification
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// A notification that one target failed to deliver
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Name of the failing target
    pub target: String,
    /// Subject the notification was about
    pub subject: String,
    /// Underlying error
    pub error: NotifyError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.subject, self.error)
    }
}

struct DeliveryFailures<'a>(&'a [DeliveryFailure]);

impl fmt::Display for DeliveryFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
