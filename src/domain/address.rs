//! Ethereum address domain type

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated Ethereum address
///
/// Keeps the original (possibly checksummed) spelling for display; equality
/// and storage keys use the lowercase form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let hex = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(|| DomainError::InvalidAddress(value.clone()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidAddress(value));
        }

        Ok(Self(value))
    }

    /// Address as originally written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form, used for identity
    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xe360934C02B4D0f0de602ea09a4ddE73287E603F";

    #[test]
    fn test_valid_address() {
        let address = Address::new(CHECKSUMMED).unwrap();
        assert_eq!(address.as_str(), CHECKSUMMED);
        assert_eq!(
            address.to_lowercase(),
            "0xe360934c02b4d0f0de602ea09a4dde73287e603f"
        );
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("e360934C02B4D0f0de602ea09a4ddE73287E603F").is_err());
        assert!(Address::new("0x1234").is_err());
        assert!(Address::new("0xg360934C02B4D0f0de602ea09a4ddE73287E603F").is_err());
        assert!(Address::new("").is_err());
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = Address::new(CHECKSUMMED).unwrap();
        let b = Address::new(CHECKSUMMED.to_lowercase()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_validates() {
        let parsed: Result<Address, _> = serde_json::from_str("\"0x12\"");
        assert!(parsed.is_err());

        let parsed: Address = serde_json::from_str(&format!("\"{}\"", CHECKSUMMED)).unwrap();
        assert_eq!(parsed.as_str(), CHECKSUMMED);
    }
}
