//! 📡 JSON-RPC Chain Client
//!
//! Thin wrapper around `eth_getBlockByNumber("latest", true)` and
//! `eth_getTransactionReceipt`. No retries live here: the scheduler's
//! fixed polling interval is the retry policy, and every call is bounded
//! by the shared HTTP client timeout.

use crate::error::TransportError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request timeout for individual RPC calls
const RPC_TIMEOUT_SECS: u64 = 10;

/// A block with its full transaction bodies, in chain order.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    #[serde(deserialize_with = "u64_from_hex")]
    pub number: u64,
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockTransaction {
    pub hash: String,
}

/// Transaction receipt: the ordered logs are all we consume.
#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "logIndex", deserialize_with = "u64_from_hex")]
    pub log_index: u64,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", deserialize_with = "u64_from_hex")]
    pub block_number: u64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for the watched chain.
pub struct ChainClient {
    client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Fetch the latest block with full transaction bodies.
    pub async fn latest_block(&self) -> Result<Block, TransportError> {
        self.call("eth_getBlockByNumber", json!(["latest", true]))
            .await
    }

    /// Fetch the receipt for a single transaction.
    pub async fn receipt_for(&self, tx_hash: &str) -> Result<Receipt, TransportError> {
        self.call("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, TransportError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RpcEnvelope<T> = response.json().await?;

        if let Some(err) = envelope.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| TransportError::Malformed(format!("{} returned null result", method)))
    }
}

fn u64_from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let digits = raw.trim_start_matches("0x");
    u64::from_str_radix(digits, 16).map_err(serde::de::Error::custom)
}
