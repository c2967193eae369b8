//! Server metrics, summarized to the log on an interval
//!
//! Counters are atomics so connection tasks can bump them without
//! coordination. The tick-duration aggregate sits behind a mutex; only
//! the game loop writes it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

/// Rolling tick samples kept for percentile calculation
const TICK_HISTORY_LEN: usize = 1000;

#[derive(Debug, Default)]
struct TickStats {
    samples: VecDeque<u64>,
    total_us: u64,
    count: u64,
    max_us: u64,
}

/// Point-in-time view of the tick duration aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub count: u64,
    pub mean_us: u64,
    pub max_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

/// Metrics registry for the game server
#[derive(Debug)]
pub struct ServerMetrics {
    pub ticks: AtomicU64,
    pub commands_processed: AtomicU64,
    pub broadcasts_sent: AtomicU64,
    pub bytes_out: AtomicU64,
    pub connections_accepted: AtomicU64,
    pub connections_rejected: AtomicU64,
    start_time: Instant,
    tick_stats: Mutex<TickStats>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            commands_processed: AtomicU64::new(0),
            broadcasts_sent: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            connections_accepted: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_stats: Mutex::new(TickStats::default()),
        }
    }

    /// Record one tick's duration
    pub fn record_tick(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let mut stats = self.tick_stats.lock();
        stats.samples.push_back(us);
        while stats.samples.len() > TICK_HISTORY_LEN {
            stats.samples.pop_front();
        }
        stats.total_us += us;
        stats.count += 1;
        if us > stats.max_us {
            stats.max_us = us;
        }
    }

    pub fn add_commands(&self, count: u64) {
        self.commands_processed.fetch_add(count, Ordering::Relaxed);
    }

    /// Count one outbound message and its encoded size
    pub fn add_broadcast(&self, bytes: u64) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Summarize the tick aggregate; percentiles come from the rolling window
    pub fn tick_summary(&self) -> TickSummary {
        let stats = self.tick_stats.lock();
        if stats.count == 0 {
            return TickSummary {
                count: 0,
                mean_us: 0,
                max_us: 0,
                p95_us: 0,
                p99_us: 0,
            };
        }

        let mut sorted: Vec<u64> = stats.samples.iter().copied().collect();
        sorted.sort_unstable();
        let p95_idx = (sorted.len() as f32 * 0.95) as usize;
        let p99_idx = (sorted.len() as f32 * 0.99) as usize;

        TickSummary {
            count: stats.count,
            mean_us: stats.total_us / stats.count,
            max_us: stats.max_us,
            p95_us: sorted[p95_idx.min(sorted.len() - 1)],
            p99_us: sorted[p99_idx.min(sorted.len() - 1)],
        }
    }

    /// Write one summary line to the log
    pub fn log_summary(&self, player_count: usize) {
        let tick = self.tick_summary();
        info!(
            "Metrics: uptime {}s, players {}, ticks {} (mean {}us, p95 {}us, p99 {}us, max {}us), \
             commands {}, broadcasts {} ({} bytes), connections +{}/-{}",
            self.uptime_seconds(),
            player_count,
            tick.count,
            tick.mean_us,
            tick.p95_us,
            tick.p99_us,
            tick.max_us,
            self.commands_processed.load(Ordering::Relaxed),
            self.broadcasts_sent.load(Ordering::Relaxed),
            self.bytes_out.load(Ordering::Relaxed),
            self.connections_accepted.load(Ordering::Relaxed),
            self.connections_rejected.load(Ordering::Relaxed),
        );
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = ServerMetrics::new();
        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tick_summary().count, 0);
        assert_eq!(metrics.tick_summary().max_us, 0);
    }

    #[test]
    fn test_record_tick_aggregates() {
        let metrics = ServerMetrics::new();

        metrics.record_tick(Duration::from_micros(100));
        metrics.record_tick(Duration::from_micros(200));
        metrics.record_tick(Duration::from_micros(600));

        let summary = metrics.tick_summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean_us, 300);
        assert_eq!(summary.max_us, 600);
        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_percentiles_from_rolling_window() {
        let metrics = ServerMetrics::new();
        for i in 1..=100 {
            metrics.record_tick(Duration::from_micros(i * 10));
        }

        let summary = metrics.tick_summary();
        assert_eq!(summary.p95_us, 960);
        assert_eq!(summary.p99_us, 1000);
    }

    #[test]
    fn test_history_window_is_bounded() {
        let metrics = ServerMetrics::new();
        for _ in 0..(TICK_HISTORY_LEN + 500) {
            metrics.record_tick(Duration::from_micros(50));
        }

        let stats = metrics.tick_stats.lock();
        assert_eq!(stats.samples.len(), TICK_HISTORY_LEN);
        assert_eq!(stats.count, (TICK_HISTORY_LEN + 500) as u64);
    }

    #[test]
    fn test_broadcast_counters() {
        let metrics = ServerMetrics::new();

        metrics.add_broadcast(128);
        metrics.add_broadcast(256);
        metrics.add_commands(5);
        metrics.connection_accepted();
        metrics.connection_rejected();

        assert_eq!(metrics.broadcasts_sent.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.bytes_out.load(Ordering::Relaxed), 384);
        assert_eq!(metrics.commands_processed.load(Ordering::Relaxed), 5);
        assert_eq!(metrics.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.connections_rejected.load(Ordering::Relaxed), 1);
    }
}
