//! Monitored subjects and their storage identity

use super::Address;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage key of the protocol aggregate
pub const TCR_KEY: &str = "notification/tcr";

/// Storage key prefix for troves
pub const TROVE_KEY_PREFIX: &str = "notification/trove/";

/// A trove being watched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredTrove {
    /// Human-readable name used in alerts
    pub name: String,
    /// Owner address
    pub address: Address,
}

impl MonitoredTrove {
    /// Create a new monitored trove
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Storage key of this trove's notification state
    pub fn storage_key(&self) -> String {
        trove_storage_key(&self.address)
    }
}

/// Storage key for a trove address
pub fn trove_storage_key(address: &Address) -> String {
    format!("{}{}", TROVE_KEY_PREFIX, address.to_lowercase())
}

/// Entity whose notification state is tracked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Protocol-wide total collateral ratio
    Tcr,
    /// A single trove, identified by address
    Trove(Address),
}

impl Subject {
    /// Storage key owned by this subject
    pub fn storage_key(&self) -> String {
        match self {
            Self::Tcr => TCR_KEY.to_string(),
            Self::Trove(address) => trove_storage_key(address),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcr => write!(f, "TCR"),
            Self::Trove(address) => write!(f, "trove {}", address),
        }
    }
}

impl FromStr for Subject {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("tcr") {
            return Ok(Self::Tcr);
        }
        Address::new(s)
            .map(Self::Trove)
            .map_err(|_| DomainError::InvalidSubject(s.to_string()))
    }
}
