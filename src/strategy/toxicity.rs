//! Detects adverse market conditions that should suppress maker quoting:
//! wide spreads (makers have already pulled back) and fast short-horizon
//! moves in the underlying (quotes would be picked off).

use tracing::debug;

use crate::model::{BookTop, RefPrice};

#[derive(Debug, Clone)]
pub struct ToxicityDetector {
    pub vol_threshold: f64,
    pub spread_threshold: f64,
}

impl ToxicityDetector {
    pub fn new(vol_threshold: f64, spread_threshold: f64) -> Self {
        Self { vol_threshold, spread_threshold }
    }

    /// `true` if the current regime is toxic and maker quoting should be
    /// skipped this tick.
    pub fn is_toxic(&self, book: &BookTop, ref_price: &RefPrice) -> bool {
        let mut reasons = Vec::new();

        if let Some(spread) = book.spread() {
            if spread > self.spread_threshold {
                reasons.push(format!("wide_spread({spread:.3})"));
            }
        }

        if ref_price.r_5s.abs() > self.vol_threshold {
            reasons.push(format!("high_vol_5s({:.4})", ref_price.r_5s));
        }

        if !reasons.is_empty() {
            debug!(token_id = %book.token_id, reasons = %reasons.join(", "), "toxic regime detected");
            return true;
        }
        false
    }
}
