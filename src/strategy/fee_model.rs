//! Fee-aware minimum edge. Most markets are fee-free for takers; the
//! `RollingWindow` class runs a parabolic taker fee (peaking at p=0.50)
//! plus a maker rebate, per `MarketClass`.

use crate::model::MarketClass;

#[derive(Debug, Clone)]
pub struct FeeModel {
    pub gas_cost_usd: f64,
    pub base_taker_fee: f64,
    pub maker_rebate: f64,
}

impl FeeModel {
    pub fn new(gas_cost_usd: f64, base_taker_fee: f64, maker_rebate: f64) -> Self {
        Self { gas_cost_usd, base_taker_fee, maker_rebate }
    }

    /// Taker fee rate at `price`. Zero outside `RollingWindow` markets.
    pub fn taker_fee_rate(&self, price: f64, class: MarketClass) -> f64 {
        if class != MarketClass::RollingWindow {
            return 0.0;
        }
        let p = price.clamp(0.0, 1.0);
        let factor = (1.0 - 4.0 * (p - 0.5).powi(2)).max(0.0);
        self.base_taker_fee * factor
    }

    /// Minimum edge (in price units) required to break even on a trade of
    /// `trade_size_usd` at `price`, given fixed gas cost, the fee curve, and
    /// a fixed risk/profit buffer (taker: 0.015, maker: 0.005).
    pub fn min_edge(&self, trade_size_usd: f64, price: f64, is_taker: bool, class: MarketClass) -> f64 {
        if trade_size_usd <= 0.0 {
            return 1.0;
        }

        let fixed_impact = self.gas_cost_usd / trade_size_usd;

        let var_fee = if is_taker {
            self.taker_fee_rate(price, class)
        } else if class == MarketClass::RollingWindow {
            -self.maker_rebate
        } else {
            0.0
        };

        let buffer = if is_taker { 0.015 } else { 0.005 };
        (fixed_impact + var_fee + buffer).max(0.0)
    }
}
