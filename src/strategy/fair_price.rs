//! Fair YES probability for a binary outcome market, from spot distance to
//! strike, time to expiry, and short-horizon volatility.

use crate::model::{Market, RefPrice};

/// Standard normal CDF via the error-function identity
/// `Φ(x) = 0.5 * (1 + erf(x / sqrt(2)))`.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26 rational approximation of `erf`, accurate to
/// about 1.5e-7 — plenty for a probability clamped to [0.01, 0.99].
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Logistic curve centered on zero distance, with `scale` controlling
/// steepness. Clamps the logit to ±100 to avoid overflow in `exp`.
pub fn logistic_prob(distance: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.5;
    }
    let x = (distance / scale).clamp(-100.0, 100.0);
    1.0 / (1.0 + (-x).exp())
}

/// Round `price` to the nearest `tick_size` and clamp into `[0.01, 0.99]`.
pub fn clamp_to_tick(price: f64, tick_size: f64) -> f64 {
    if tick_size <= 0.0 {
        return price;
    }
    let ticks = (price / tick_size).round();
    let clamped = (ticks * tick_size).clamp(0.01, 0.99);
    (clamped * 10_000.0).round() / 10_000.0
}

/// Price adjustment pushing quotes away from the side we're already long,
/// proportional to how full the inventory book is.
pub fn calculate_inventory_skew(position_qty: f64, max_inventory: f64, skew_factor: f64) -> f64 {
    if max_inventory <= 0.0 {
        return 0.0;
    }
    let normalized = position_qty / max_inventory;
    (-normalized * skew_factor).clamp(-0.1, 0.1)
}

/// Computes fair YES probability and the resulting edge against the market.
#[derive(Debug, Clone)]
pub struct FairPriceCalculator {
    pub sigma_floor: f64,
    pub use_normal_cdf: bool,
}

impl FairPriceCalculator {
    pub fn new(sigma_floor: f64, use_normal_cdf: bool) -> Self {
        Self { sigma_floor, use_normal_cdf }
    }

    /// Fair YES probability for `market` given `ref_price` at `current_ts`
    /// (unix seconds). `None` if the market carries no strike.
    pub fn calculate_fair_prob(&self, market: &Market, ref_price: &RefPrice, current_ts: i64) -> Option<f64> {
        let strike = market.strike?;
        let distance = ref_price.spot_mid - strike;
        let tau = (market.expiry_ts - current_ts).max(1) as f64;
        let sigma = ref_price.vol_30s.max(self.sigma_floor);

        let p_fair = if self.use_normal_cdf {
            let mut vol_scaled = sigma * tau.sqrt();
            if vol_scaled == 0.0 {
                vol_scaled = self.sigma_floor;
            }
            normal_cdf(distance / vol_scaled)
        } else {
            const K0: f64 = 1000.0;
            const K1: f64 = 100.0;
            let scale = K0 + K1 * sigma * tau.sqrt();
            logistic_prob(distance, scale)
        };

        Some(p_fair.clamp(0.01, 0.99))
    }

    /// `p_fair - p_market`; positive means YES is underpriced.
    pub fn calculate_edge(p_fair: f64, p_market: f64) -> f64 {
        p_fair - p_market
    }
}
