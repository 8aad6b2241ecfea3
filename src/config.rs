// Buy Watcher Configuration - loaded from .env
// Operator-facing settings (pool identity, alert cosmetics) live in
// PoolConfiguration; process-level settings stay on Config.

use crate::error::ConfigurationError;
use log::info;
use std::env;

/// Social platforms rendered on the alert's trailing link line,
/// in this fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Telegram,
    Twitter,
    Website,
    Dexscreener,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 4] = [
        SocialPlatform::Telegram,
        SocialPlatform::Twitter,
        SocialPlatform::Website,
        SocialPlatform::Dexscreener,
    ];

    /// Clickable label for the social line. Dexscreener renders under
    /// the short label "DexS"; everything else title-cased.
    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Telegram => "Telegram",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Website => "Website",
            SocialPlatform::Dexscreener => "DexS",
        }
    }

    fn env_var(&self) -> &'static str {
        match self {
            SocialPlatform::Telegram => "SOCIAL_TELEGRAM",
            SocialPlatform::Twitter => "SOCIAL_TWITTER",
            SocialPlatform::Website => "SOCIAL_WEBSITE",
            SocialPlatform::Dexscreener => "SOCIAL_DEXSCREENER",
        }
    }
}

/// Media attached to alerts: an already-uploaded file handle wins over
/// a raw URL (URL dispatch by extension happens at compose time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Upload(String),
    Url(String),
}

/// Everything the pipeline needs to know about the watched pool.
///
/// Owned by the operator-facing collaborator and read-only to the core;
/// the scheduler clones an immutable snapshot of this at the start of
/// every tick so an update can never race an in-flight scan.
#[derive(Debug, Clone)]
pub struct PoolConfiguration {
    /// Pool contract address, lower-cased hex
    pub pool_address: String,
    /// Target token contract address, lower-cased hex
    pub target_token_address: String,
    pub target_symbol: String,
    pub counter_symbol: String,
    /// USD per emoji glyph on the intensity bar
    pub step_usd: f64,
    pub emoji: String,
    pub media: Option<MediaSource>,
    /// (platform, url) pairs in SocialPlatform::ALL order
    pub social_links: Vec<(SocialPlatform, String)>,
    /// Block explorer base URL for address/tx links
    pub explorer_url: String,
}

#[derive(Clone)]
pub struct Config {
    // ========================================================================
    // CHAIN CONNECTIVITY
    // ========================================================================
    pub rpc_url: String,
    pub chain_id: u64,

    // ========================================================================
    // MARKET DATA
    // ========================================================================
    pub dex_api_url: String,

    // ========================================================================
    // TELEGRAM DELIVERY
    // ========================================================================
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    // ========================================================================
    // SCAN SCHEDULING
    // ========================================================================
    pub poll_interval_secs: u64,
    pub receipt_concurrency: usize,
    pub cursor_capacity: usize,

    // ========================================================================
    // POOL & ALERT SETTINGS
    // ========================================================================
    pub pool: PoolConfiguration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        // Required vars first
        let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let telegram_chat_id = require("TELEGRAM_CHAT_ID")?;
        let pool_address = env::var("PAIR_ADDRESS")
            .map_err(|_| ConfigurationError::NoPool)?
            .to_lowercase();
        let target_token_address = require("TARGET_TOKEN_ADDRESS")?.to_lowercase();

        let step_usd: f64 = env::var("EMOJI_STEP_USD")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|e| ConfigurationError::Invalid {
                name: "EMOJI_STEP_USD",
                reason: format!("{}", e),
            })?;
        if step_usd <= 0.0 {
            return Err(ConfigurationError::Invalid {
                name: "EMOJI_STEP_USD",
                reason: "must be positive".to_string(),
            });
        }

        let media = match (env::var("MEDIA_FILE_ID"), env::var("MEDIA_URL")) {
            (Ok(id), _) if !id.is_empty() => Some(MediaSource::Upload(id)),
            (_, Ok(url)) if !url.is_empty() => Some(MediaSource::Url(url)),
            _ => None,
        };

        let social_links = SocialPlatform::ALL
            .iter()
            .filter_map(|p| match env::var(p.env_var()) {
                Ok(url) if !url.is_empty() => Some((*p, url)),
                _ => None,
            })
            .collect();

        Ok(Config {
            rpc_url: env::var("RPC_URL")
                .unwrap_or_else(|_| "https://rpc.hyperliquid.xyz/evm".to_string()),
            chain_id: parse_var("CHAIN_ID", 256)?,
            dex_api_url: env::var("DEX_API_URL")
                .unwrap_or_else(|_| "https://api.dexscreener.com/latest/dex".to_string()),
            telegram_bot_token,
            telegram_chat_id,
            poll_interval_secs: parse_var("POLL_INTERVAL_SECS", 5)?,
            receipt_concurrency: parse_var("RECEIPT_CONCURRENCY", 8)?,
            cursor_capacity: parse_var("CURSOR_CAPACITY", 1000)?,
            pool: PoolConfiguration {
                pool_address,
                target_token_address,
                target_symbol: env::var("TARGET_TOKEN_SYMBOL")
                    .unwrap_or_else(|_| "CHAM".to_string()),
                counter_symbol: env::var("COUNTER_TOKEN_SYMBOL")
                    .unwrap_or_else(|_| "HYPE".to_string()),
                step_usd,
                emoji: env::var("EMOJI").unwrap_or_else(|_| "🦎".to_string()),
                media,
                social_links,
                explorer_url: env::var("EXPLORER_URL")
                    .unwrap_or_else(|_| "https://hyperevmscan.io".to_string()),
            },
        })
    }

    pub fn print_startup_info(&self) {
        info!("⚙️  Configuration loaded:");
        info!("   📡 RPC: {}", self.rpc_url);
        info!("   ⛓️  Chain ID: {}", self.chain_id);
        info!("   🏊 Pool: {}", self.pool.pool_address);
        info!(
            "   🎯 Target: {} ({})",
            self.pool.target_symbol, self.pool.target_token_address
        );
        info!(
            "   🦎 Emoji: {} (${} per glyph)",
            self.pool.emoji, self.pool.step_usd
        );
        info!(
            "   ⏱️  Poll interval: {}s (receipt concurrency: {})",
            self.poll_interval_secs, self.receipt_concurrency
        );
        info!(
            "   🔗 Social links: {}",
            self.pool
                .social_links
                .iter()
                .map(|(p, _)| p.label())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

fn require(name: &'static str) -> Result<String, ConfigurationError> {
    env::var(name).map_err(|_| ConfigurationError::Invalid {
        name,
        reason: "missing from environment".to_string(),
    })
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigurationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigurationError::Invalid {
            name,
            reason: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}
