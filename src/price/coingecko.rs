//! CoinGecko ETH/USD price source

use super::PriceSource;
use crate::error::PriceError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Public CoinGecko simple-price endpoint for ETH in USD
pub const ETH_VS_USD_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd";

/// Price source querying the CoinGecko HTTP API
pub struct CoinGeckoSource {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoSource {
    /// Create a source using the public endpoint
    pub fn new() -> Self {
        Self::with_url(ETH_VS_USD_URL)
    }

    /// Create a source using a custom endpoint (mirrors, proxies)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn request(&self, timeout: Option<Duration>) -> Result<f64, PriceError> {
        let mut request = self.client.get(&self.url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `ethereum.usd` from a simple-price response
fn parse_response(body: &Value) -> Result<f64, PriceError> {
    body.get("ethereum")
        .and_then(|eth| eth.get("usd"))
        .and_then(Value::as_f64)
        .ok_or_else(|| PriceError::MalformedResponse {
            source_name: "CoinGecko".to_string(),
            body: body.to_string(),
        })
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_price(&self, timeout: Option<Duration>) -> Option<f64> {
        match self.request(timeout).await {
            Ok(price) => Some(price),
            Err(e) => {
                log::warn!("Failed to fetch price from CoinGecko: {}", e);
                None
            }
        }
    }
}
