//! Scan Cursor - at-most-one alert per swap event
//!
//! The scheduler re-scans whatever block is "latest" every tick, so the
//! same (txHash, logIndex) pair can show up across consecutive ticks.
//! The cursor tracks already-alerted event keys in a capacity-bounded
//! set (oldest evicted first) plus the last scanned block number, and is
//! checked before every alert is emitted.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Unique identifier for a swap event
type EventKey = (String, u64);

/// Counters for periodic stats logging.
#[derive(Debug, Default, Clone)]
pub struct CursorStats {
    pub total_checked: u64,
    pub duplicates_dropped: u64,
    pub unique_events: u64,
}

impl CursorStats {
    /// Duplicate rate as a percentage
    pub fn duplicate_rate(&self) -> f64 {
        if self.total_checked == 0 {
            0.0
        } else {
            (self.duplicates_dropped as f64 / self.total_checked as f64) * 100.0
        }
    }
}

struct SeenSet {
    keys: HashSet<EventKey>,
    order: VecDeque<EventKey>,
}

/// Deduplication cursor over (txHash, logIndex) event keys.
pub struct ScanCursor {
    seen: Mutex<SeenSet>,
    max_capacity: usize,
    last_block: AtomicU64,
    stats: Mutex<CursorStats>,
}

impl ScanCursor {
    pub fn new(max_capacity: usize) -> Self {
        Self {
            seen: Mutex::new(SeenSet {
                keys: HashSet::with_capacity(max_capacity),
                order: VecDeque::with_capacity(max_capacity),
            }),
            max_capacity,
            last_block: AtomicU64::new(0),
            stats: Mutex::new(CursorStats::default()),
        }
    }

    /// Check whether this event was already alerted, marking it as seen
    /// if not. Returns true when the event should be dropped.
    pub fn already_alerted(&self, tx_hash: &str, log_index: u64) -> bool {
        let mut seen = self.seen.lock().unwrap();
        let mut stats = self.stats.lock().unwrap();

        stats.total_checked += 1;

        let key = (tx_hash.to_lowercase(), log_index);
        if seen.keys.contains(&key) {
            stats.duplicates_dropped += 1;
            return true;
        }

        seen.keys.insert(key.clone());
        seen.order.push_back(key);
        stats.unique_events += 1;

        // Evict oldest entries once over capacity
        while seen.order.len() > self.max_capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.keys.remove(&oldest);
            }
        }

        false
    }

    /// Record the block number of the current scan.
    pub fn record_block(&self, block_number: u64) {
        self.last_block.store(block_number, Ordering::Relaxed);
    }

    /// Block number of the most recent scan (0 before the first tick).
    pub fn last_block(&self) -> u64 {
        self.last_block.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CursorStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_event_alerts_at_most_once() {
        let cursor = ScanCursor::new(100);

        // First occurrence passes, every re-scan is dropped
        assert!(!cursor.already_alerted("0xfeed", 3));
        assert!(cursor.already_alerted("0xfeed", 3));
        assert!(cursor.already_alerted("0xfeed", 3));
    }

    #[test]
    fn test_distinct_log_indexes_are_distinct_events() {
        let cursor = ScanCursor::new(100);

        // Two swaps in the same transaction
        assert!(!cursor.already_alerted("0xfeed", 0));
        assert!(!cursor.already_alerted("0xfeed", 1));
        assert!(cursor.already_alerted("0xfeed", 0));
        assert!(cursor.already_alerted("0xfeed", 1));
    }

    #[test]
    fn test_tx_hash_casing_does_not_split_events() {
        let cursor = ScanCursor::new(100);
        assert!(!cursor.already_alerted("0xABCDEF", 0));
        assert!(cursor.already_alerted("0xabcdef", 0));
    }

    #[test]
    fn test_capacity_eviction_drops_oldest_first() {
        let cursor = ScanCursor::new(3);

        for i in 0..4 {
            assert!(!cursor.already_alerted("0xfeed", i));
        }
        assert_eq!(cursor.len(), 3);

        // Oldest entry was evicted, so it passes again; newest still dropped
        assert!(!cursor.already_alerted("0xfeed", 0));
        assert!(cursor.already_alerted("0xfeed", 3));
    }

    #[test]
    fn test_stats() {
        let cursor = ScanCursor::new(100);

        cursor.already_alerted("0xaaa", 0); // unique
        cursor.already_alerted("0xaaa", 0); // duplicate
        cursor.already_alerted("0xbbb", 0); // unique
        cursor.already_alerted("0xaaa", 0); // duplicate

        let stats = cursor.stats();
        assert_eq!(stats.total_checked, 4);
        assert_eq!(stats.unique_events, 2);
        assert_eq!(stats.duplicates_dropped, 2);
        assert_eq!(stats.duplicate_rate(), 50.0);
    }

    #[test]
    fn test_block_tracking() {
        let cursor = ScanCursor::new(10);
        assert_eq!(cursor.last_block(), 0);
        cursor.record_block(1234);
        assert_eq!(cursor.last_block(), 1234);
    }
}
