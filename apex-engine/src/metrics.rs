//! Minimal latency-percentile bookkeeping. Deliberately thin: record a
//! sample, read back p50/p99/max. No exporter, just the basic latency
//! bookkeeping the hot path needs.

use hdrhistogram::Histogram;

pub struct LatencyRecorder {
    histogram: Histogram<u64>,
}

impl LatencyRecorder {
    /// Tracks latencies from 1ns to 10 seconds with 3 significant digits.
    pub fn new() -> Self {
        Self { histogram: Histogram::new_with_bounds(1, 10_000_000_000, 3).expect("valid hdr bounds") }
    }

    pub fn record_ns(&mut self, elapsed_ns: u64) {
        let _ = self.histogram.record(elapsed_ns.max(1));
    }

    pub fn p50_ns(&self) -> u64 {
        self.histogram.value_at_quantile(0.50)
    }

    pub fn p99_ns(&self) -> u64 {
        self.histogram.value_at_quantile(0.99)
    }

    pub fn max_ns(&self) -> u64 {
        self.histogram.max()
    }

    pub fn count(&self) -> u64 {
        self.histogram.len()
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}
