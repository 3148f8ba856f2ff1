//! trovemon - Liquity trove and TCR monitoring library
//!
//! This library watches the protocol's total collateral ratio and a list of
//! troves, and notifies once when a ratio crosses below its threshold.
//!
//! # Modules
//!
//! - [`alerts`]: Notification gate, dispatcher and targets
//! - [`chain`]: Chain data source abstraction
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`price`]: Price sources and aggregation
//! - [`services`]: Monitoring run and watch loop
//! - [`storage`]: Persistent key-value storage

pub mod alerts;
pub mod chain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod price;
pub mod services;
pub mod storage;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
