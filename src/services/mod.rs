//! Service layer
//!
//! Services encapsulate the business logic of a monitoring run and the loop
//! that repeats it.

pub mod monitor;

pub use monitor::{Monitor, MonitorConfig, RunSummary, SubjectOutcome, WatchConfig};
