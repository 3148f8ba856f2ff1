//! Price reported by the chain data source's own feed

use super::{with_timeout, PriceSource};
use crate::chain::ChainDataSource;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Price source backed by [`ChainDataSource::get_price`]
pub struct PriceFeedSource {
    data_source: Arc<dyn ChainDataSource>,
}

impl PriceFeedSource {
    /// Create a source reading from `data_source`
    pub fn new(data_source: Arc<dyn ChainDataSource>) -> Self {
        Self { data_source }
    }
}

#[async_trait]
impl PriceSource for PriceFeedSource {
    async fn fetch_price(&self, timeout: Option<Duration>) -> Option<f64> {
        match with_timeout(timeout, self.data_source.get_price()).await {
            Ok(Ok(price)) => Some(price),
            Ok(Err(e)) => {
                log::warn!("Failed to fetch price from price feed: {}", e);
                None
            }
            Err(e) => {
                log::warn!("Failed to fetch price from price feed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainSnapshot, SnapshotDataSource};
    use crate::mock::FailingDataSource;

    #[tokio::test]
    async fn test_feed_price() {
        let snapshot = ChainSnapshot {
            price: 1650.25,
            ..Default::default()
        };
        let source = PriceFeedSource::new(Arc::new(SnapshotDataSource::new(snapshot)));
        assert_eq!(source.fetch_price(None).await, Some(1650.25));
    }

    #[tokio::test]
    async fn test_feed_failure_is_absent() {
        let source = PriceFeedSource::new(Arc::new(FailingDataSource::new()));
        assert_eq!(source.fetch_price(Some(Duration::from_secs(1))).await, None);
    }
}
