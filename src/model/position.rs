//! Per-token position, carried at average cost.

use crate::types::{Fill, Side};

/// Average-cost-basis position in a single token.
///
/// `qty` is signed: positive is long, negative is short. `avg_cost` is the
/// average price paid (long) or received (short) for the open quantity, and
/// is only meaningful while `qty != 0.0`.
#[derive(Debug, Clone, Default)]
pub struct Position {
    pub token_id: String,
    pub qty: f64,
    pub avg_cost: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            qty: 0.0,
            avg_cost: 0.0,
            realized_pnl: 0.0,
        }
    }

    /// Signed quantity delta a fill represents: positive for BUY, negative
    /// for SELL.
    fn signed_qty(fill: &Fill) -> f64 {
        match fill.side {
            Side::Buy => fill.size,
            Side::Sell => -fill.size,
        }
    }

    /// Apply a fill using average-cost-basis accounting:
    ///
    /// - A fill that adds to or opens a position blends into `avg_cost` and
    ///   leaves `realized_pnl` untouched.
    /// - A fill that reduces or closes a position realizes P&L against the
    ///   existing `avg_cost` for the closed quantity.
    /// - A fill that flips the position (crosses through zero) closes the
    ///   old side entirely at the old `avg_cost`, then opens the new side at
    ///   the fill price.
    ///
    /// Fees are subtracted from `realized_pnl` unconditionally, matching
    /// fee accrual on both opening and closing trades.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let delta = Self::signed_qty(fill);
        let same_direction = self.qty == 0.0 || delta.signum() == self.qty.signum();

        if same_direction {
            let new_qty = self.qty + delta;
            if new_qty != 0.0 {
                self.avg_cost = (self.avg_cost * self.qty.abs() + fill.price * delta.abs()) / new_qty.abs();
            }
            self.qty = new_qty;
        } else {
            let closing = delta.abs().min(self.qty.abs());
            let pnl_per_unit = if self.qty > 0.0 {
                fill.price - self.avg_cost
            } else {
                self.avg_cost - fill.price
            };
            self.realized_pnl += pnl_per_unit * closing;

            let remainder = delta.abs() - closing;
            let new_qty = self.qty + delta;

            if remainder > 0.0 {
                self.avg_cost = fill.price;
            } else if new_qty == 0.0 {
                self.avg_cost = 0.0;
            }
            self.qty = new_qty;
        }

        self.realized_pnl -= fill.fee;
    }

    /// Mark-to-market P&L of the open position at `mid`.
    pub fn unrealized_pnl(&self, mid: f64) -> f64 {
        if self.qty > 0.0 {
            (mid - self.avg_cost) * self.qty
        } else if self.qty < 0.0 {
            (self.avg_cost - mid) * self.qty.abs()
        } else {
            0.0
        }
    }

    /// Absolute notional of the open position at `mid`.
    pub fn notional(&self, mid: f64) -> f64 {
        self.qty.abs() * mid
    }
}
