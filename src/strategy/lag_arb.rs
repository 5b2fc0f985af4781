//! Taker strategy: cross the book when fair value diverges sharply from
//! the market-implied price.

use tracing::{debug, info, warn};

use crate::model::{BookTop, Market};
use crate::strategy::fee_model::FeeModel;
use crate::types::{Intent, IntentMode, Side};

/// Fires at most one taker intent per call, only when the after-fee edge
/// clears both `edge_threshold` and the fee model's minimum edge, and the
/// book isn't too wide to trust.
#[derive(Debug, Clone)]
pub struct LagArbStrategy {
    pub edge_threshold: f64,
    pub max_slippage: f64,
    pub default_size: f64,
}

impl LagArbStrategy {
    pub fn new(edge_threshold: f64, max_slippage: f64, default_size: f64) -> Self {
        Self { edge_threshold, max_slippage, default_size }
    }

    /// Taker intent (0 or 1 element) against YES, given `p_fair` for `market`.
    pub fn generate_intents(&self, market: &Market, book: &BookTop, p_fair: f64, fee_model: &FeeModel) -> Vec<Intent> {
        let Some(p_market) = book.mid() else {
            debug!(slug = %market.slug, "no mid price, skipping lag arb");
            return Vec::new();
        };

        let edge = p_fair - p_market;
        if edge.abs() < self.edge_threshold {
            return Vec::new();
        }

        let (side, price, available_size) = if edge > 0.0 {
            (Side::Buy, book.ask_px, book.ask_sz)
        } else {
            (Side::Sell, book.bid_px, book.bid_sz)
        };

        let (Some(price), Some(available_size)) = (price, available_size) else {
            debug!(slug = %market.slug, ?side, "no price available for lag arb side");
            return Vec::new();
        };

        let Some(spread) = book.spread() else {
            return Vec::new();
        };
        if spread > self.max_slippage {
            warn!(slug = %market.slug, spread, max = self.max_slippage, "spread too wide for lag arb");
            return Vec::new();
        }

        let size = self.default_size.min(available_size).max(market.min_size);

        // `fee_model.min_edge` already folds the taker fee curve (plus gas and the
        // risk buffer) into `required`, so the edge compared against it must be the
        // raw price-vs-fair-value edge — subtracting the fee again here would count
        // it twice for `RollingWindow` markets.
        let net_edge = match side {
            Side::Buy => p_fair - price,
            Side::Sell => price - p_fair,
        };

        let required = fee_model.min_edge(size * price, price, true, market.class);
        if net_edge < required {
            debug!(slug = %market.slug, net_edge, required, "after-fee edge below min_edge");
            return Vec::new();
        }

        let reason = format!("lag_arb_{}_yes_edge={edge:.4}", side.as_str().to_lowercase());

        match Intent::new(market.yes_token_id.clone(), side, price, size, IntentMode::Taker, 1_000, reason) {
            Ok(intent) => {
                info!(slug = %market.slug, ?side, price, size, edge, net_edge, "generated taker intent");
                vec![intent]
            }
            Err(err) => {
                warn!(slug = %market.slug, %err, "rejected invalid taker intent");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Market {
        Market::new("m", "BTCUSDT", Some(100_000.0), 2_000, "yes", "no", 0.01, 1.0, None, crate::model::MarketClass::Standard)
            .unwrap()
    }

    fn book(bid: f64, ask: f64) -> BookTop {
        BookTop {
            token_id: "yes".into(),
            bid_px: Some(bid),
            bid_sz: Some(50.0),
            ask_px: Some(ask),
            ask_sz: Some(50.0),
            ts_ms: 0,
        }
    }

    fn fees() -> FeeModel {
        FeeModel::new(0.01, 0.02, 0.002)
    }

    #[test]
    fn below_threshold_yields_no_intent() {
        let strat = LagArbStrategy::new(0.03, 0.02, 10.0);
        let intents = strat.generate_intents(&market(), &book(0.50, 0.51), 0.515, &fees());
        assert!(intents.is_empty());
    }

    #[test]
    fn strong_positive_edge_buys_yes_at_ask() {
        let strat = LagArbStrategy::new(0.03, 0.05, 10.0);
        let intents = strat.generate_intents(&market(), &book(0.50, 0.51), 0.60, &fees());
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].side, Side::Buy);
        assert!((intents[0].price - 0.51).abs() < 1e-9);
        assert_eq!(intents[0].mode, IntentMode::Taker);
    }

    #[test]
    fn strong_negative_edge_sells_yes_at_bid() {
        let strat = LagArbStrategy::new(0.03, 0.05, 10.0);
        let intents = strat.generate_intents(&market(), &book(0.50, 0.51), 0.40, &fees());
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].side, Side::Sell);
    }

    #[test]
    fn wide_spread_suppresses_taker() {
        let strat = LagArbStrategy::new(0.03, 0.02, 10.0);
        let intents = strat.generate_intents(&market(), &book(0.40, 0.55), 0.60, &fees());
        assert!(intents.is_empty());
    }

    #[test]
    fn edge_below_fee_model_min_edge_is_rejected() {
        let strat = LagArbStrategy::new(0.03, 0.05, 10.0);
        let expensive_fees = FeeModel::new(5.0, 0.02, 0.002);
        let intents = strat.generate_intents(&market(), &book(0.50, 0.51), 0.60, &expensive_fees);
        assert!(intents.is_empty());
    }
}
