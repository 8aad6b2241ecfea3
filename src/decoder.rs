//! 🔍 Swap Log Decoder
//!
//! Decodes pool swap events with the fixed V2-style payload layout:
//! four consecutive uint256 words (amount0In, amount1In, amount0Out,
//! amount1Out). The counterparty address comes from the third indexed
//! topic and is re-encoded with EIP-55 checksum casing for display only;
//! it is never used for comparisons.

use crate::chain::LogEntry;
use crate::error::DecodeError;
use alloy_primitives::{Address, U256};

/// Exact payload length of a V2 swap event: 4 x 32-byte words
pub const SWAP_PAYLOAD_LEN: usize = 128;

/// A decoded swap event, immutable, discarded after classification.
#[derive(Debug, Clone)]
pub struct RawSwapLog {
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u64,
    pub address: String,
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
    /// EIP-55 checksummed trader address, display-only
    pub counterparty: String,
}

/// Case-insensitive filter on the emitting contract address.
pub fn matches_pool(log: &LogEntry, pool_address: &str) -> bool {
    log.address.eq_ignore_ascii_case(pool_address)
}

/// Decode a pool log into a [`RawSwapLog`]. Total: any failure is a
/// [`DecodeError`], never a panic.
pub fn decode(log: &LogEntry) -> Result<RawSwapLog, DecodeError> {
    let payload = hex::decode(log.data.trim_start_matches("0x"))?;
    if payload.len() != SWAP_PAYLOAD_LEN {
        return Err(DecodeError::BadLength(payload.len()));
    }

    let word = |i: usize| U256::from_be_slice(&payload[i * 32..(i + 1) * 32]);

    Ok(RawSwapLog {
        block_number: log.block_number,
        tx_hash: log.transaction_hash.clone(),
        log_index: log.log_index,
        address: log.address.clone(),
        amount0_in: word(0),
        amount1_in: word(1),
        amount0_out: word(2),
        amount1_out: word(3),
        counterparty: counterparty_from_topics(&log.topics)?,
    })
}

/// Lowest 20 bytes of the third topic, checksummed.
fn counterparty_from_topics(topics: &[String]) -> Result<String, DecodeError> {
    let topic = topics.get(2).ok_or(DecodeError::MissingTopic)?;
    let bytes = hex::decode(topic.trim_start_matches("0x"))?;
    if bytes.len() != 32 {
        return Err(DecodeError::BadTopic(bytes.len()));
    }
    Ok(Address::from_slice(&bytes[12..]).to_checksum(None))
}
