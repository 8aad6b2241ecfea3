//! 💬 Alert Composer
//!
//! Pure formatting: no I/O, no shared state. Takes a classified trade,
//! a market snapshot and the pool configuration and renders the final
//! Markdown message plus an optional media reference.

use crate::classifier::ClassifiedTrade;
use crate::config::{MediaSource, PoolConfiguration, SocialPlatform};
use crate::market::MarketSnapshot;
use url::Url;

/// Emoji bar never exceeds this many glyphs
pub const MAX_EMOJI_COUNT: usize = 50;

/// Video file extensions for media-URL dispatch
const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".mov", ".mkv", ".webm"];

/// Media attached to a delivered alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Previously uploaded file handle (sent as an animation)
    Upload(String),
    Photo(String),
    Video(String),
    Animation(String),
}

/// A fully rendered alert, immutable once produced.
#[derive(Debug, Clone)]
pub struct RenderedAlert {
    pub text: String,
    pub media: Option<MediaRef>,
}

/// Repeat the configured glyph once per `step_usd` of buy value,
/// clamped to [0, 50].
pub fn render_emoji_bar(usd_value: f64, step_usd: f64, glyph: &str) -> String {
    if step_usd <= 0.0 || usd_value <= 0.0 {
        return String::new();
    }
    let count = ((usd_value / step_usd).floor() as usize).min(MAX_EMOJI_COUNT);
    glyph.repeat(count)
}

/// Abbreviate large values: >= 1000 renders as thousands with a K
/// suffix, smaller values as plain two-decimal fixed point.
pub fn abbreviate(value: f64) -> String {
    if value >= 1000.0 {
        format!("{:.2}K", value / 1000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// `0x1234...abcd` form for inline display.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Resolve the configured media reference. An uploaded handle wins over
/// a URL; URLs dispatch on file extension.
pub fn select_media(config: &PoolConfiguration) -> Option<MediaRef> {
    match config.media.as_ref()? {
        MediaSource::Upload(file_id) => Some(MediaRef::Upload(file_id.clone())),
        MediaSource::Url(raw) => {
            // Sniff the URL path; fall back to the raw string when it
            // does not parse as a URL
            let path = Url::parse(raw)
                .map(|u| u.path().to_ascii_lowercase())
                .unwrap_or_else(|_| raw.to_ascii_lowercase());

            if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
                Some(MediaRef::Video(raw.clone()))
            } else if path.ends_with(".gif") {
                Some(MediaRef::Animation(raw.clone()))
            } else {
                Some(MediaRef::Photo(raw.clone()))
            }
        }
    }
}

/// Render the buy alert. Field order is fixed: headline, emoji bar,
/// counter amount + USD, target amount, counterparty + change + txn,
/// price, liquidity, mcap, reference price, then the social line.
pub fn compose(
    trade: &ClassifiedTrade,
    snapshot: &MarketSnapshot,
    config: &PoolConfiguration,
) -> RenderedAlert {
    let usd_value = trade.counter_amount * snapshot.reference_price_usd;

    let mut lines = vec![
        format!("{} Buy!", config.target_symbol),
        String::new(),
        render_emoji_bar(usd_value, config.step_usd, &config.emoji),
        String::new(),
        format!(
            "💵 {:.2} {} (${:.2})",
            trade.counter_amount, config.counter_symbol, usd_value
        ),
        format!(
            "💰 {} {}",
            abbreviate(trade.target_amount),
            config.target_symbol
        ),
        String::new(),
        format!(
            "[{}]({}/address/{}) {:+.1}% │ [Txn]({}/tx/{})",
            shorten_address(&trade.counterparty),
            config.explorer_url,
            trade.counterparty,
            snapshot.change_24h,
            config.explorer_url,
            trade.tx_hash
        ),
        format!("Price: ${:.6}", snapshot.price_usd),
        format!("Liquidity: ${}", abbreviate(snapshot.liquidity_usd)),
        format!("MCap: ${}", abbreviate(snapshot.market_cap_usd)),
        format!(
            "{} Price: ${:.4}",
            config.counter_symbol, snapshot.reference_price_usd
        ),
    ];

    let socials = social_line(config);
    if !socials.is_empty() {
        lines.push(String::new());
        lines.push(socials);
    }

    RenderedAlert {
        text: lines.join("\n"),
        media: select_media(config),
    }
}

/// Configured social links as clickable labels in fixed platform order.
fn social_line(config: &PoolConfiguration) -> String {
    SocialPlatform::ALL
        .iter()
        .filter_map(|platform| {
            config
                .social_links
                .iter()
                .find(|(p, _)| p == platform)
                .map(|(_, url)| format!("[{}]({})", platform.label(), url))
        })
        .collect::<Vec<_>>()
        .join(" │ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TradeDirection;

    fn pool_config() -> PoolConfiguration {
        PoolConfiguration {
            pool_address: "0xpool".to_string(),
            target_token_address: "0xtarget".to_string(),
            target_symbol: "CHAM".to_string(),
            counter_symbol: "HYPE".to_string(),
            step_usd: 1.0,
            emoji: "🦎".to_string(),
            media: None,
            social_links: vec![],
            explorer_url: "https://hyperevmscan.io".to_string(),
        }
    }

    fn buy_trade() -> ClassifiedTrade {
        ClassifiedTrade {
            direction: TradeDirection::Buy,
            counter_amount: 12.34,
            target_amount: 2_345_000.0,
            counterparty: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            tx_hash: "0xfeed".to_string(),
            block_number: 1,
        }
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            price_usd: 0.004217,
            liquidity_usd: 152_340.0,
            market_cap_usd: 421_700.0,
            change_24h: 4.2,
            reference_price_usd: 25.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_emoji_bar_counts_and_clamps() {
        assert_eq!(render_emoji_bar(0.0, 1.0, "🦎"), "");
        assert_eq!(render_emoji_bar(2.9, 1.0, "🦎"), "🦎🦎");
        // 12.34 HYPE at $25 = $308.50 -> clamped to 50 glyphs
        let bar = render_emoji_bar(12.34 * 25.0, 1.0, "🦎");
        assert_eq!(bar.chars().count(), 50);
    }

    #[test]
    fn test_emoji_bar_monotone_in_usd_value() {
        let mut previous = 0;
        for cents in 0..2000 {
            let usd = cents as f64 * 0.25;
            let count = render_emoji_bar(usd, 3.0, "x").len();
            assert!(count >= previous, "bar shrank at usd={}", usd);
            previous = count;
        }
    }

    #[test]
    fn test_emoji_bar_ignores_non_positive_step() {
        assert_eq!(render_emoji_bar(100.0, 0.0, "🦎"), "");
        assert_eq!(render_emoji_bar(100.0, -1.0, "🦎"), "");
    }

    #[test]
    fn test_abbreviation_examples() {
        assert_eq!(abbreviate(2_345_000.0), "2345.00K");
        assert_eq!(abbreviate(42.5), "42.50");
        assert_eq!(abbreviate(1000.0), "1.00K");
        assert_eq!(abbreviate(999.99), "999.99");
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            "0x5aAe...eAed"
        );
        assert_eq!(shorten_address("0xshort"), "0xshort");
    }

    #[test]
    fn test_compose_field_order() {
        let alert = compose(&buy_trade(), &snapshot(), &pool_config());
        let lines: Vec<&str> = alert.text.lines().collect();

        assert_eq!(lines[0], "CHAM Buy!");
        assert_eq!(lines[2].chars().count(), 50); // emoji bar, clamped
        assert_eq!(lines[4], "💵 12.34 HYPE ($308.50)");
        assert_eq!(lines[5], "💰 2345.00K CHAM");
        assert!(lines[7].contains("[0x5aAe...eAed](https://hyperevmscan.io/address/"));
        assert!(lines[7].contains("+4.2%"));
        assert!(lines[7].contains("[Txn](https://hyperevmscan.io/tx/0xfeed)"));
        assert_eq!(lines[8], "Price: $0.004217");
        assert_eq!(lines[9], "Liquidity: $152.34K");
        assert_eq!(lines[10], "MCap: $421.70K");
        assert_eq!(lines[11], "HYPE Price: $25.0000");
        assert!(alert.media.is_none());
    }

    #[test]
    fn test_compose_with_zeroed_snapshot_still_renders() {
        // Market data endpoint down: alert is still emitted, fields zero
        let alert = compose(&buy_trade(), &MarketSnapshot::default(), &pool_config());

        assert!(alert.text.contains("($0.00)"));
        assert!(alert.text.contains("Price: $0.000000"));
        assert!(alert.text.contains("Liquidity: $0.00"));
        assert!(alert.text.contains("MCap: $0.00"));
        // No USD value -> empty emoji bar line
        assert_eq!(alert.text.lines().nth(2).unwrap(), "");
    }

    #[test]
    fn test_negative_change_renders_signed() {
        let mut snap = snapshot();
        snap.change_24h = -7.25;
        let alert = compose(&buy_trade(), &snap, &pool_config());
        assert!(alert.text.contains("-7.2%"));
        assert!(!alert.text.contains("+-"));
    }

    #[test]
    fn test_social_line_order_and_labels() {
        let mut config = pool_config();
        config.social_links = vec![
            (SocialPlatform::Dexscreener, "https://dexscreener.com/x".to_string()),
            (SocialPlatform::Telegram, "https://t.me/x".to_string()),
        ];

        let alert = compose(&buy_trade(), &snapshot(), &config);
        let last = alert.text.lines().last().unwrap();
        // Fixed platform order regardless of configured order, DexS label
        assert_eq!(
            last,
            "[Telegram](https://t.me/x) │ [DexS](https://dexscreener.com/x)"
        );
    }

    #[test]
    fn test_no_social_line_when_unconfigured() {
        let alert = compose(&buy_trade(), &snapshot(), &pool_config());
        assert_eq!(alert.text.lines().last().unwrap(), "HYPE Price: $25.0000");
    }

    #[test]
    fn test_media_upload_wins_over_url() {
        let mut config = pool_config();
        config.media = Some(MediaSource::Upload("file123".to_string()));
        assert_eq!(select_media(&config), Some(MediaRef::Upload("file123".to_string())));
    }

    #[test]
    fn test_media_url_extension_dispatch() {
        let mut config = pool_config();

        for ext in ["mp4", "mov", "mkv", "webm"] {
            let url = format!("https://cdn.example.com/clip.{}", ext);
            config.media = Some(MediaSource::Url(url.clone()));
            assert_eq!(select_media(&config), Some(MediaRef::Video(url)));
        }

        config.media = Some(MediaSource::Url("https://cdn.example.com/buy.gif".to_string()));
        assert_eq!(
            select_media(&config),
            Some(MediaRef::Animation("https://cdn.example.com/buy.gif".to_string()))
        );

        config.media = Some(MediaSource::Url("https://cdn.example.com/logo.png".to_string()));
        assert_eq!(
            select_media(&config),
            Some(MediaRef::Photo("https://cdn.example.com/logo.png".to_string()))
        );
    }

    #[test]
    fn test_media_url_ignores_query_string() {
        let mut config = pool_config();
        let url = "https://cdn.example.com/clip.mp4?token=abc".to_string();
        config.media = Some(MediaSource::Url(url.clone()));
        assert_eq!(select_media(&config), Some(MediaRef::Video(url)));
    }
}
