//! Domain models for trovemon
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod address;
pub mod price;
pub mod subject;
pub mod trove;

pub use address::Address;
pub use price::PriceDatum;
pub use subject::{trove_storage_key, MonitoredTrove, Subject, TCR_KEY};
pub use trove::{ClosedStatus, Position, Trove, TroveSnapshot, TroveStatus};
