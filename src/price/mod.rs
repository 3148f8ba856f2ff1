//! Multi-source price aggregation
//!
//! Every registered source is queried concurrently and the lowest valid answer
//! wins.

mod coingecko;
mod feed;

pub use coingecko::CoinGeckoSource;
pub use feed::PriceFeedSource;

use crate::domain::PriceDatum;
use crate::error::PriceError;
use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

/// Timeout used by a monitoring run when querying price sources
pub const DEFAULT_PRICE_TIMEOUT: Duration = Duration::from_secs(10);

/// A single price source
///
/// Implementations never fail: fetch or validation errors are logged by the
/// source and reported as `None`.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current ETH/USD price, giving up after `timeout`
    async fn fetch_price(&self, timeout: Option<Duration>) -> Option<f64>;
}

/// Ordered registry of named price sources
///
/// Registration order is the tie-break order of [`lowest_price`].
#[derive(Default)]
pub struct PriceSources {
    sources: Vec<(String, Box<dyn PriceSource>)>,
}

impl PriceSources {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under `name`
    pub fn add(&mut self, name: impl Into<String>, source: Box<dyn PriceSource>) {
        self.sources.push((name.into(), source));
    }

    /// Builder form of [`PriceSources::add`]
    pub fn with(mut self, name: impl Into<String>, source: Box<dyn PriceSource>) -> Self {
        self.add(name, source);
        self
    }

    /// Registered source names in order
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Query all sources and return the lowest price with its source
pub async fn lowest_price(
    sources: &PriceSources,
    timeout: Option<Duration>,
) -> Result<PriceDatum, PriceError> {
    let responses = join_all(sources.sources.iter().map(|(name, source)| async move {
        (name.as_str(), source.fetch_price(timeout).await)
    }))
    .await;

    let mut lowest: Option<PriceDatum> = None;

    for (name, value) in responses {
        let value = match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            Some(v) => {
                log::warn!("Ignoring invalid price {} from {}", v, name);
                continue;
            }
            None => {
                log::debug!("No price from {}", name);
                continue;
            }
        };

        // Strictly lower only, so the earlier source wins ties
        if lowest.as_ref().map_or(true, |best| value < best.value) {
            lowest = Some(PriceDatum::new(name, value));
        }
    }

    let price = lowest.ok_or(PriceError::NoPriceAvailable)?;
    log::debug!("Lowest price {} from {}", price.value, price.source);
    Ok(price)
}

/// Race `fetch` against `timeout`
///
/// Without a timeout the fetch runs to completion.
pub async fn with_timeout<T, F>(timeout: Option<Duration>, fetch: F) -> Result<T, PriceError>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| PriceError::Timeout(limit)),
        None => Ok(fetch.await),
    }
}
