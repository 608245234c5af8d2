//! Ticker counters, readable from any thread while the ticker runs.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TickerStats {
    delivered: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    overruns: AtomicU64,
    spawned: AtomicU64,
    attach_failures: AtomicU64,
}

/// Point-in-time copy of `TickerStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Ticks that reached the callback target
    pub delivered: u64,
    /// Ticks dropped because the target was gone
    pub skipped: u64,
    /// Ticks whose callback raised or failed
    pub failed: u64,
    pub overruns: u64,
    /// Worker threads started over the controller's lifetime
    pub spawned: u64,
    pub attach_failures: u64,
}

impl TickerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sequence number of the delivered tick, starting at 1
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_skipped(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attach_failure(&self) {
        self.attach_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            spawned: self.spawned.load(Ordering::Relaxed),
            attach_failures: self.attach_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = TickerStats::new();
        assert_eq!(stats.record_delivered(), 1);
        assert_eq!(stats.record_delivered(), 2);
        stats.record_skipped();
        stats.record_overrun();
        stats.record_spawn();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.overruns, 1);
        assert_eq!(snapshot.spawned, 1);
        assert_eq!(snapshot.failed, 0);
    }
}
