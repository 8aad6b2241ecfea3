//! 📊 Market Data Client
//!
//! Fetches the pair-statistics snapshot (price, liquidity, market cap,
//! 24h change) from the aggregator's `/pairs/{chainId}/{pair}` endpoint.
//! Upstream omits fields freely and mixes number/string encodings, so
//! every numeric field parses leniently and defaults to zero.

use crate::error::MarketDataError;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Request timeout for snapshot fetches
const MARKET_TIMEOUT_SECS: u64 = 10;

/// Point-in-time market statistics for the pool. All numeric fields are
/// zero when the upstream source omits them; never null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub price_usd: f64,
    pub liquidity_usd: f64,
    /// Fully-diluted market cap
    pub market_cap_usd: f64,
    pub change_24h: f64,
    /// USD price of the pool's reference asset (token0)
    pub reference_price_usd: f64,
    /// Pool composition metadata, used for target-side detection
    pub token0_address: String,
    pub token1_address: String,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    #[serde(default)]
    pair: Option<PairStats>,
}

#[derive(Debug, Deserialize)]
struct PairStats {
    #[serde(rename = "priceUsd", default, deserialize_with = "lenient_f64")]
    price_usd: f64,
    #[serde(rename = "liquidityUsd", default, deserialize_with = "lenient_f64")]
    liquidity_usd: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    fdv: f64,
    #[serde(rename = "priceChange24h", default, deserialize_with = "lenient_f64")]
    price_change_24h: f64,
    #[serde(default)]
    token0: TokenStats,
    #[serde(default)]
    token1: TokenStats,
}

#[derive(Debug, Deserialize, Default)]
struct TokenStats {
    #[serde(rename = "priceUsd", default, deserialize_with = "lenient_f64")]
    price_usd: f64,
    #[serde(default)]
    address: String,
}

impl From<PairStats> for MarketSnapshot {
    fn from(pair: PairStats) -> Self {
        MarketSnapshot {
            price_usd: pair.price_usd,
            liquidity_usd: pair.liquidity_usd,
            market_cap_usd: pair.fdv,
            change_24h: pair.price_change_24h,
            reference_price_usd: pair.token0.price_usd,
            token0_address: pair.token0.address,
            token1_address: pair.token1.address,
        }
    }
}

/// HTTP client for the pair-statistics aggregator.
pub struct MarketDataClient {
    client: reqwest::Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(base_url: &str) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MARKET_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a fresh snapshot for the pool. A missing `pair` object
    /// yields an all-zero snapshot; transport and status failures are
    /// [`MarketDataError`].
    pub async fn snapshot(
        &self,
        chain_id: u64,
        pool_address: &str,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let url = format!("{}/pairs/{}/{}", self.base_url, chain_id, pool_address);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::Status(response.status()));
        }

        let body: PairResponse = response.json().await?;
        Ok(body.pair.map(MarketSnapshot::from).unwrap_or_default())
    }
}

/// Accept numbers, numeric strings, or null; anything else is zero.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(value)) => value,
        Some(Raw::Text(text)) => text.parse().unwrap_or(0.0),
        None => 0.0,
    })
}
