//! Turns a stream of spot price samples into the short-horizon returns and
//! rolling volatility carried on `RefPrice` (`r_1s`, `r_5s`, `vol_30s`).

use std::collections::VecDeque;

const WINDOW_MS: i64 = 30_000;

pub struct RollingReturns {
    samples: VecDeque<(i64, f64)>,
}

impl RollingReturns {
    pub fn new() -> Self {
        Self { samples: VecDeque::new() }
    }

    fn evict_expired(&mut self, now_ms: i64) {
        while let Some(&(ts, _)) = self.samples.front() {
            if now_ms - ts > WINDOW_MS {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn price_at_or_before(&self, cutoff_ms: i64) -> Option<f64> {
        self.samples.iter().rev().find(|&&(ts, _)| ts <= cutoff_ms).map(|&(_, p)| p)
    }

    fn stddev_of_returns(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let returns: Vec<f64> = self
            .samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(&(_, p0), &(_, p1))| (p1 - p0) / p0)
            .collect();
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        variance.sqrt()
    }

    /// Record a new sample, evict anything older than the 30s window, and
    /// return `(r_1s, r_5s, vol_30s)` computed from the updated window.
    pub fn push(&mut self, ts_ms: i64, price: f64) -> (f64, f64, f64) {
        self.samples.push_back((ts_ms, price));
        self.evict_expired(ts_ms);

        let r_1s = self.price_at_or_before(ts_ms - 1_000).map(|p0| (price - p0) / p0).unwrap_or(0.0);
        let r_5s = self.price_at_or_before(ts_ms - 5_000).map(|p0| (price - p0) / p0).unwrap_or(0.0);
        let vol_30s = self.stddev_of_returns();

        (r_1s, r_5s, vol_30s)
    }
}

impl Default for RollingReturns {
    fn default() -> Self {
        Self::new()
    }
}
