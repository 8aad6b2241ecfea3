//! 🦎 Buy Watcher
//!
//! Watches a single on-chain liquidity pool for buy swaps of a target
//! token and posts a formatted alert for each one. Pipeline per tick:
//! latest block → transaction receipts → swap log decoding → buy/sell
//! classification → market data enrichment → message rendering →
//! Telegram delivery.

pub mod alert;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod market;
pub mod scheduler;
pub mod telegram;
