//! 🎯 Trade Classifier
//!
//! Determines which side of the pool holds the target token, classifies
//! swap direction, and converts base-unit integers to decimal amounts.
//!
//! Amount scaling assumes the 18-decimal convention of the chain's
//! native-style tokens. TODO: look up per-token decimals from pool
//! metadata so tokens with non-18 decimals scale correctly.

use crate::decoder::RawSwapLog;
use crate::error::ConfigurationError;
use crate::market::MarketSnapshot;
use alloy_primitives::U256;

/// Base-unit exponent shared by both pool tokens (known simplification)
const TOKEN_DECIMALS: i32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Which pool index the target token occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSide {
    Token0,
    Token1,
}

/// A classified swap, per-event and transient.
#[derive(Debug, Clone)]
pub struct ClassifiedTrade {
    pub direction: TradeDirection,
    /// Counter-asset amount paid in, decimal-scaled
    pub counter_amount: f64,
    /// Target-token amount received out, decimal-scaled
    pub target_amount: f64,
    pub counterparty: String,
    pub tx_hash: String,
    pub block_number: u64,
}

/// Match the configured target token against the pool composition
/// reported by the market data source.
pub fn detect_target_side(
    snapshot: &MarketSnapshot,
    target_token_address: &str,
    pool_address: &str,
) -> Result<PoolSide, ConfigurationError> {
    // Empty addresses come from a zeroed snapshot (metadata fetch failed)
    if !snapshot.token0_address.is_empty()
        && snapshot.token0_address.eq_ignore_ascii_case(target_token_address)
    {
        Ok(PoolSide::Token0)
    } else if !snapshot.token1_address.is_empty()
        && snapshot.token1_address.eq_ignore_ascii_case(target_token_address)
    {
        Ok(PoolSide::Token1)
    } else {
        Err(ConfigurationError::TokenNotInPool {
            token: target_token_address.to_string(),
            pool: pool_address.to_string(),
        })
    }
}

/// Classify a decoded swap. Direction is Buy iff the target-token "out"
/// amount is strictly positive; zero target output (sells, pure
/// liquidity events) classifies as Sell and produces no alert.
pub fn classify(raw: &RawSwapLog, target_side: PoolSide) -> ClassifiedTrade {
    let (counter_in, target_out) = match target_side {
        PoolSide::Token0 => (raw.amount1_in, raw.amount0_out),
        PoolSide::Token1 => (raw.amount0_in, raw.amount1_out),
    };

    let direction = if target_out > U256::ZERO {
        TradeDirection::Buy
    } else {
        TradeDirection::Sell
    };

    ClassifiedTrade {
        direction,
        counter_amount: from_wei(counter_in),
        target_amount: from_wei(target_out),
        counterparty: raw.counterparty.clone(),
        tx_hash: raw.tx_hash.clone(),
        block_number: raw.block_number,
    }
}

/// Base units -> decimal amount under the fixed 18-decimal convention.
pub fn from_wei(raw: U256) -> f64 {
    // U256 displays as decimal digits; parsing those into f64 cannot fail
    let value: f64 = raw.to_string().parse().unwrap_or(0.0);
    value / 10f64.powi(TOKEN_DECIMALS)
}
