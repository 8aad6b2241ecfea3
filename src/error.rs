//! Error taxonomy for the scan pipeline.
//!
//! Every error here is contained per-tick or per-log by the scheduler;
//! nothing in this module is fatal to the process. The fixed polling
//! interval is the retry mechanism for transient failures.

use thiserror::Error;

/// RPC transport failures. A block fetch failure aborts the whole tick
/// (nothing to scan); a receipt fetch failure skips only that transaction.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rpc request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

/// Log payload does not match the expected 4x uint256 swap layout.
/// Such logs are skipped, never fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("swap payload is {0} bytes, expected 128")]
    BadLength(usize),

    #[error("swap payload is not valid hex: {0}")]
    BadHex(#[from] hex::FromHexError),

    #[error("missing counterparty topic")]
    MissingTopic,

    #[error("counterparty topic is {0} bytes, expected 32")]
    BadTopic(usize),
}

/// Market data endpoint failures. Callers degrade to a zero-valued
/// snapshot rather than dropping the alert.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Configuration problems that make a tick unscannable.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no pool configured")]
    NoPool,

    #[error("target token {token} is not part of pool {pool}")]
    TokenNotInPool { token: String, pool: String },

    #[error("invalid configuration value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Notification sink failures. Logged and skipped; the swap stays marked
/// as alerted (at-most-once delivery).
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification api error: {0}")]
    Api(String),
}
