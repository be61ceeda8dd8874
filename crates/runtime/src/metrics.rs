use std::collections::VecDeque;

use serde::Serialize;

/// Samples kept for percentile reporting; older samples are dropped first.
pub const LATENCY_SAMPLE_CAPACITY: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyPercentiles {
    pub count: usize,
    pub p50_micros: u64,
    pub p90_micros: u64,
    pub p95_micros: u64,
    pub p99_micros: u64,
    pub max_micros: u64,
}

/// Wall time spent inside `Session::advance`, over a sliding window.
#[derive(Debug, Clone)]
pub struct TickLatencyMetrics {
    latencies_micros: VecDeque<u64>,
    capacity: usize,
}

impl Default for TickLatencyMetrics {
    fn default() -> Self {
        Self::with_capacity(LATENCY_SAMPLE_CAPACITY)
    }
}

impl TickLatencyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            latencies_micros: VecDeque::with_capacity(capacity.min(LATENCY_SAMPLE_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn record_latency_micros(&mut self, latency_micros: u64) {
        if self.latencies_micros.len() == self.capacity {
            self.latencies_micros.pop_front();
        }
        self.latencies_micros.push_back(latency_micros);
    }

    pub fn percentiles(&self) -> Option<LatencyPercentiles> {
        if self.latencies_micros.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.latencies_micros.iter().copied().collect();
        sorted.sort_unstable();
        let count = sorted.len();

        Some(LatencyPercentiles {
            count,
            p50_micros: percentile_nearest_rank(&sorted, 50),
            p90_micros: percentile_nearest_rank(&sorted, 90),
            p95_micros: percentile_nearest_rank(&sorted, 95),
            p99_micros: percentile_nearest_rank(&sorted, 99),
            max_micros: sorted[count - 1],
        })
    }
}

fn percentile_nearest_rank(sorted: &[u64], percentile: usize) -> u64 {
    let count = sorted.len();
    let rank = (percentile * count).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}

/// Running totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub price_ticks: u64,
    pub candles_appended: u64,
    pub wagers_submitted: u64,
    pub wagers_rejected: u64,
    pub wagers_settled: u64,
    pub wagers_expired: u64,
    pub asset_switches: u64,
    /// Non-finite values replaced while generating candle history.
    pub degenerate_values: u64,
}
