//! Maker strategy: quote both sides around fair value, skewed by inventory.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Market, Position};
use crate::strategy::fair_price::{calculate_inventory_skew, clamp_to_tick};
use crate::strategy::fee_model::FeeModel;
use crate::types::{Intent, IntentMode, Side};

/// Quotes both sides around fair value, skewed by inventory. A side is
/// dropped (rather than the whole quote) when its offered edge doesn't
/// clear the fee model's minimum maker edge — callers separately gate
/// whether maker quoting should happen at all (toxicity, risk).
#[derive(Debug, Clone)]
pub struct MarketMakerStrategy {
    pub half_spread: f64,
    pub default_size: f64,
    pub quote_ttl_ms: u64,
    pub inventory_skew_factor: f64,
    pub max_inventory: f64,
}

impl MarketMakerStrategy {
    pub fn new(half_spread: f64, default_size: f64, quote_ttl_ms: u64, inventory_skew_factor: f64, max_inventory: f64) -> Self {
        Self { half_spread, default_size, quote_ttl_ms, inventory_skew_factor, max_inventory }
    }

    /// Bid + ask maker intents on YES for `market`, centered on `p_fair`
    /// and skewed by the current YES position.
    pub fn generate_intents(
        &self,
        market: &Market,
        p_fair: f64,
        positions: &HashMap<String, Position>,
        fee_model: &FeeModel,
    ) -> Vec<Intent> {
        let qty = positions.get(&market.yes_token_id).map(|p| p.qty).unwrap_or(0.0);
        let skew = calculate_inventory_skew(qty, self.max_inventory, self.inventory_skew_factor);
        let p_center = p_fair + skew;

        let bid_price = clamp_to_tick(p_center - self.half_spread, market.tick_size);
        let ask_price = clamp_to_tick(p_center + self.half_spread, market.tick_size);

        debug!(slug = %market.slug, p_fair, skew, bid_price, ask_price, "market maker quotes");

        let trade_size_usd = self.default_size * p_fair;
        let required = fee_model.min_edge(trade_size_usd, p_fair, false, market.class);

        let mut intents = Vec::with_capacity(2);
        if p_fair - bid_price >= required {
            if let Ok(bid) = Intent::new(
                market.yes_token_id.clone(),
                Side::Buy,
                bid_price,
                self.default_size,
                IntentMode::Maker,
                self.quote_ttl_ms,
                format!("mm_bid_pfair={p_fair:.4}_skew={skew:.6}"),
            ) {
                intents.push(bid);
            }
        }
        if ask_price - p_fair >= required {
            if let Ok(ask) = Intent::new(
                market.yes_token_id.clone(),
                Side::Sell,
                ask_price,
                self.default_size,
                IntentMode::Maker,
                self.quote_ttl_ms,
                format!("mm_ask_pfair={p_fair:.4}_skew={skew:.6}"),
            ) {
                intents.push(ask);
            }
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Market {
        Market::new("m", "BTCUSDT", Some(100_000.0), 2_000, "yes", "no", 0.01, 1.0, None, crate::model::MarketClass::Standard)
            .unwrap()
    }

    fn fees() -> FeeModel {
        FeeModel::new(0.01, 0.02, 0.002)
    }

    #[test]
    fn neutral_inventory_quotes_symmetric_around_fair() {
        let strat = MarketMakerStrategy::new(0.02, 10.0, 3000, 0.0004, 500.0);
        let intents = strat.generate_intents(&market(), 0.50, &HashMap::new(), &fees());
        assert_eq!(intents.len(), 2);
        assert!((intents[0].price - 0.48).abs() < 1e-9);
        assert!((intents[1].price - 0.52).abs() < 1e-9);
    }

    #[test]
    fn long_inventory_skews_quotes_down() {
        let strat = MarketMakerStrategy::new(0.02, 10.0, 3000, 0.0004, 500.0);
        let mut positions = HashMap::new();
        let mut pos = Position::new("yes");
        pos.qty = 400.0;
        positions.insert("yes".to_string(), pos);

        let skewed = strat.generate_intents(&market(), 0.50, &positions, &fees());
        let neutral = strat.generate_intents(&market(), 0.50, &HashMap::new(), &fees());
        assert!(skewed[0].price < neutral[0].price);
    }

    #[test]
    fn insufficient_spread_drops_the_unprofitable_side() {
        let strat = MarketMakerStrategy::new(0.001, 10.0, 3000, 0.0004, 500.0);
        let intents = strat.generate_intents(&market(), 0.50, &HashMap::new(), &fees());
        assert!(intents.is_empty());
    }
}
