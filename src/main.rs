use anyhow::{Context, Result};
use log::{info, warn};

use buy_watcher::chain::ChainClient;
use buy_watcher::config::Config;
use buy_watcher::market::MarketDataClient;
use buy_watcher::scheduler::ScanScheduler;
use buy_watcher::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Load .env file
    dotenv::dotenv().ok();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("🦎 BUY WATCHER - pool swap alert pipeline");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.print_startup_info();

    // Initialize components
    let chain = ChainClient::new(&config.rpc_url).context("Failed to create chain client")?;
    info!("✅ Chain client: {}", config.rpc_url);

    let market =
        MarketDataClient::new(&config.dex_api_url).context("Failed to create market client")?;
    info!("✅ Market data client: {}", config.dex_api_url);

    let telegram = TelegramClient::new(&config.telegram_bot_token, &config.telegram_chat_id)
        .context("Failed to create telegram client")?;
    info!("✅ Telegram client: chat {}", config.telegram_chat_id);

    if let Err(e) = telegram
        .send_message("🦎 Buy watcher started — monitoring begins now")
        .await
    {
        warn!("⚠️  Startup notification failed: {}", e);
    }

    // Start the scan loop
    let scheduler = ScanScheduler::new(chain, market, telegram, &config);
    scheduler.start();

    info!("");
    info!("🚀 WATCHING {} (every {}s)", config.pool.pool_address, config.poll_interval_secs);
    info!("   Press Ctrl-C to stop");
    info!("");

    // Run until interrupted; let an in-flight tick finish before exit
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("🛑 Shutdown signal received");
    scheduler.stop().await;

    Ok(())
}
