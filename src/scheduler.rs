//! ⏱️  Scan Scheduler
//!
//! Periodic, cancellable polling loop: every tick fetches the latest
//! block, walks its transaction receipts, decodes and classifies pool
//! swap logs, and forwards each previously unseen buy to the
//! notification sink. A single task runs the loop, so ticks never
//! overlap; a tick that outruns the interval delays the next one.
//!
//! Nothing in a tick is fatal: a block-fetch failure skips the tick, a
//! receipt-fetch failure skips that transaction, an undecodable log is
//! skipped, and a market-data failure degrades to zero-valued fields.

use crate::alert;
use crate::chain::ChainClient;
use crate::classifier::{self, PoolSide, TradeDirection};
use crate::config::{Config, PoolConfiguration};
use crate::cursor::ScanCursor;
use crate::decoder;
use crate::market::{MarketDataClient, MarketSnapshot};
use crate::telegram::NotificationSink;
use futures_util::{stream, StreamExt};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Periodic scan loop driving the whole pipeline.
pub struct ScanScheduler<S: NotificationSink + 'static> {
    inner: Arc<SchedulerInner<S>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct SchedulerInner<S> {
    chain: ChainClient,
    market: MarketDataClient,
    sink: S,
    /// Operator settings; cloned into an immutable snapshot per tick
    pool_config: RwLock<PoolConfiguration>,
    cursor: ScanCursor,
    /// Pool side of the target token, cached after first detection
    cached_side: Mutex<Option<PoolSide>>,
    chain_id: u64,
    tick_interval: Duration,
    receipt_concurrency: usize,
    running: AtomicBool,
    stop_signal: Notify,
}

impl<S: NotificationSink + 'static> ScanScheduler<S> {
    pub fn new(chain: ChainClient, market: MarketDataClient, sink: S, config: &Config) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                chain,
                market,
                sink,
                pool_config: RwLock::new(config.pool.clone()),
                cursor: ScanCursor::new(config.cursor_capacity),
                cached_side: Mutex::new(None),
                chain_id: config.chain_id,
                tick_interval: Duration::from_secs(config.poll_interval_secs),
                receipt_concurrency: config.receipt_concurrency.max(1),
                running: AtomicBool::new(false),
                stop_signal: Notify::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Start the periodic scan. Warns and no-ops when already running.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("⚠️  Already monitoring");
            return;
        }

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            inner.run_loop().await;
        });
        *self.handle.lock().unwrap() = Some(handle);

        info!(
            "✅ Monitoring started — scanning every {}s",
            self.inner.tick_interval.as_secs()
        );
    }

    /// Stop the scan. A tick already in flight completes first; only
    /// future ticks are prevented. Safe to call from any task.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            warn!("⚠️  Not currently monitoring");
            return;
        }
        self.inner.stop_signal.notify_waiters();

        let handle = { self.handle.lock().unwrap().take() };
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let stats = self.inner.cursor.stats();
        info!(
            "🛑 Monitoring stopped (events: {} unique, {} duplicates dropped)",
            stats.unique_events, stats.duplicates_dropped
        );
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Swap in new operator settings between ticks. The cached pool
    /// side is cleared since the pool identity may have changed.
    pub async fn update_pool_config(&self, pool: PoolConfiguration) {
        *self.inner.pool_config.write().await = pool;
        *self.inner.cached_side.lock().unwrap() = None;
        info!("⚙️  Pool configuration updated");
    }
}

impl<S: NotificationSink> SchedulerInner<S> {
    async fn run_loop(&self) {
        let mut tick = interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = self.stop_signal.notified() => break,
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.run_tick().await;
            // A stop() issued mid-tick misses the notify; the flag catches it
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }
        debug!("⏱️  Scan loop exited");
    }

    async fn run_tick(&self) {
        // Immutable snapshot of the operator settings for this tick
        let config = self.pool_config.read().await.clone();

        // Market metadata and block fetch are independent
        let (snapshot_result, block_result) = tokio::join!(
            self.market.snapshot(self.chain_id, &config.pool_address),
            self.chain.latest_block(),
        );

        let block = match block_result {
            Ok(block) => block,
            Err(e) => {
                warn!("⚠️  Block fetch failed, skipping tick: {}", e);
                return;
            }
        };

        let tick_snapshot = match snapshot_result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("📊 Snapshot fetch failed, using zeroed fields: {}", e);
                MarketSnapshot::default()
            }
        };

        let side = match self.resolve_target_side(&tick_snapshot, &config) {
            Ok(side) => side,
            Err(e) => {
                warn!("⚠️  Pool composition unknown, skipping tick: {}", e);
                return;
            }
        };

        // "latest" often repeats at this polling interval; identical
        // block content cannot produce new events
        if block.number == self.cursor.last_block() {
            debug!("⏭️  Block {} already scanned", block.number);
            return;
        }
        self.cursor.record_block(block.number);
        debug!(
            "🔍 Scanning block {} ({} transactions)",
            block.number,
            block.transactions.len()
        );

        // Receipt fetches are independent; bound them and keep tx order
        let receipt_futures: Vec<_> = block
            .transactions
            .iter()
            .map(|tx| {
                let hash = tx.hash.clone();
                async move {
                    let result = self.chain.receipt_for(&hash).await;
                    (hash, result)
                }
            })
            .collect();
        let receipts: Vec<_> = stream::iter(receipt_futures)
            .buffered(self.receipt_concurrency)
            .collect()
            .await;

        for (tx_hash, result) in receipts {
            let receipt = match result {
                Ok(receipt) => receipt,
                Err(e) => {
                    debug!("⏭️  Receipt fetch failed for {}: {}", tx_hash, e);
                    continue;
                }
            };

            for log in &receipt.logs {
                if !decoder::matches_pool(log, &config.pool_address) {
                    continue;
                }

                let raw = match decoder::decode(log) {
                    Ok(raw) => raw,
                    Err(e) => {
                        debug!("⏭️  Skipping log {}/{}: {}", tx_hash, log.log_index, e);
                        continue;
                    }
                };

                let trade = classifier::classify(&raw, side);
                if trade.direction != TradeDirection::Buy {
                    continue;
                }

                if self.cursor.already_alerted(&raw.tx_hash, raw.log_index) {
                    debug!("⏭️  Already alerted {}/{}", raw.tx_hash, raw.log_index);
                    continue;
                }

                // Fresh snapshot per buy; a failure degrades to zeroes
                let snapshot = match self
                    .market
                    .snapshot(self.chain_id, &config.pool_address)
                    .await
                {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("⚠️  Market data unavailable, alerting with zeroed fields: {}", e);
                        MarketSnapshot::default()
                    }
                };

                let rendered = alert::compose(&trade, &snapshot, &config);
                info!(
                    "💰 Buy detected: {:.2} {} → {} {} ({})",
                    trade.counter_amount,
                    config.counter_symbol,
                    alert::abbreviate(trade.target_amount),
                    config.target_symbol,
                    trade.tx_hash
                );

                if let Err(e) = self.sink.deliver(&rendered).await {
                    error!("❌ Alert delivery failed: {}", e);
                }
            }
        }
    }

    /// Target-token side, detected once from pool metadata and cached
    /// (pool composition does not change under a fixed pool address).
    fn resolve_target_side(
        &self,
        snapshot: &MarketSnapshot,
        config: &PoolConfiguration,
    ) -> Result<PoolSide, crate::error::ConfigurationError> {
        let mut cached = self.cached_side.lock().unwrap();
        if let Some(side) = *cached {
            return Ok(side);
        }

        let side = classifier::detect_target_side(
            snapshot,
            &config.target_token_address,
            &config.pool_address,
        )?;
        info!(
            "🎯 Target token {} occupies pool side {:?}",
            config.target_symbol, side
        );
        *cached = Some(side);
        Ok(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::RenderedAlert;
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use std::env;

    struct RecordingSink {
        delivered: tokio::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError> {
            self.delivered.lock().await.push(alert.text.clone());
            Ok(())
        }
    }

    fn test_config() -> Config {
        env::set_var("TELEGRAM_BOT_TOKEN", "t");
        env::set_var("TELEGRAM_CHAT_ID", "c");
        env::set_var("PAIR_ADDRESS", "0xPOOL");
        env::set_var("TARGET_TOKEN_ADDRESS", "0xTARGET");
        // Unroutable endpoints: ticks fail fast and are contained
        env::set_var("RPC_URL", "http://127.0.0.1:9");
        env::set_var("DEX_API_URL", "http://127.0.0.1:9");
        Config::from_env().unwrap()
    }

    fn test_scheduler() -> ScanScheduler<RecordingSink> {
        let config = test_config();
        ScanScheduler::new(
            ChainClient::new(&config.rpc_url).unwrap(),
            MarketDataClient::new(&config.dex_api_url).unwrap(),
            RecordingSink {
                delivered: tokio::sync::Mutex::new(Vec::new()),
            },
            &config,
        )
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_returns_to_idle() {
        let scheduler = test_scheduler();
        assert!(!scheduler.is_running());

        scheduler.start();
        assert!(scheduler.is_running());

        // Second start is a warning no-op, not a second loop
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop().await;
        assert!(!scheduler.is_running());

        // Stopping again is also a no-op
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let scheduler = test_scheduler();
        scheduler.start();
        scheduler.stop().await;
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_failing_tick_does_not_kill_the_loop() {
        // Both endpoints refuse connections; the loop must survive a tick
        let scheduler = test_scheduler();
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_update_pool_config_clears_cached_side() {
        let scheduler = test_scheduler();
        *scheduler.inner.cached_side.lock().unwrap() = Some(PoolSide::Token1);

        let new_pool = scheduler.inner.pool_config.read().await.clone();
        scheduler.update_pool_config(new_pool).await;

        assert!(scheduler.inner.cached_side.lock().unwrap().is_none());
    }
}
