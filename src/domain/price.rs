//! Price domain type

use serde::{Deserialize, Serialize};
use std::fmt;

/// A price quote together with the source that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDatum {
    /// Source name as registered with the aggregator
    pub source: String,
    /// Price in USD
    pub value: f64,
}

impl PriceDatum {
    /// Create a new price datum
    pub fn new(source: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

impl fmt::Display for PriceDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (source: {})", self.value, self.source)
    }
}
