//! Combines lag arbitrage (take when edge is large) and market making
//! (quote otherwise) into one decision per market per tick.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::model::{BookTop, Market, Position, RefPrice};
use crate::strategy::fair_price::FairPriceCalculator;
use crate::strategy::fee_model::FeeModel;
use crate::strategy::lag_arb::LagArbStrategy;
use crate::strategy::market_maker::MarketMakerStrategy;
use crate::strategy::toxicity::ToxicityDetector;
use crate::types::Intent;

/// Priority: taker wins outright when it fires; maker only runs otherwise,
/// and only when the toxicity detector doesn't flag the regime. Taker and
/// maker outputs are never mixed for the same market in one tick.
pub struct HybridRouter {
    pub fair_price: FairPriceCalculator,
    pub lag_arb: LagArbStrategy,
    pub market_maker: MarketMakerStrategy,
    pub toxicity: ToxicityDetector,
    pub fee_model: FeeModel,
}

impl HybridRouter {
    pub fn new(
        fair_price: FairPriceCalculator,
        lag_arb: LagArbStrategy,
        market_maker: MarketMakerStrategy,
        toxicity: ToxicityDetector,
        fee_model: FeeModel,
    ) -> Self {
        Self { fair_price, lag_arb, market_maker, toxicity, fee_model }
    }

    /// Intents for one market: either one taker intent, two maker intents,
    /// or none.
    pub fn generate_intents(
        &self,
        market: &Market,
        book: &BookTop,
        ref_price: &RefPrice,
        positions: &HashMap<String, Position>,
        current_ts: i64,
        feed_stale_ms: i64,
    ) -> Vec<Intent> {
        if book.is_stale(current_ts * 1000, feed_stale_ms) {
            warn!(slug = %market.slug, "book stale, skipping");
            return Vec::new();
        }
        if ref_price.is_stale(current_ts * 1000, feed_stale_ms) {
            warn!(symbol = %ref_price.symbol, "reference price stale, skipping");
            return Vec::new();
        }

        let Some(p_fair) = self.fair_price.calculate_fair_prob(market, ref_price, current_ts) else {
            warn!(slug = %market.slug, "could not compute fair price");
            return Vec::new();
        };

        let taker_intents = self.lag_arb.generate_intents(market, book, p_fair, &self.fee_model);
        if !taker_intents.is_empty() {
            info!(slug = %market.slug, n = taker_intents.len(), "taker edge detected");
            return taker_intents;
        }

        if self.toxicity.is_toxic(book, ref_price) {
            debug!(slug = %market.slug, "toxic regime, suppressing maker quotes");
            return Vec::new();
        }

        self.market_maker.generate_intents(market, p_fair, positions, &self.fee_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarketClass;

    fn router() -> HybridRouter {
        HybridRouter::new(
            FairPriceCalculator::new(0.001, true),
            LagArbStrategy::new(0.03, 0.05, 10.0),
            MarketMakerStrategy::new(0.02, 10.0, 3000, 0.0004, 500.0),
            ToxicityDetector::new(0.001, 0.05),
            FeeModel::new(0.01, 0.02, 0.002),
        )
    }

    fn market() -> Market {
        Market::new("m", "BTCUSDT", Some(100_000.0), 2_000, "yes", "no", 0.01, 1.0, None, MarketClass::Standard).unwrap()
    }

    fn book(bid: f64, ask: f64, ts_ms: i64) -> BookTop {
        BookTop { token_id: "yes".into(), bid_px: Some(bid), bid_sz: Some(50.0), ask_px: Some(ask), ask_sz: Some(50.0), ts_ms }
    }

    fn ref_price(spot: f64, r_5s: f64, ts_ms: i64) -> RefPrice {
        RefPrice { symbol: "BTCUSDT".into(), spot_mid: spot, r_1s: 0.0, r_5s, vol_30s: 0.02, ts_ms }
    }

    #[test]
    fn stale_book_emits_nothing() {
        let r = router();
        let intents = r.generate_intents(&market(), &book(0.50, 0.51, 0), &ref_price(100_000.0, 0.0, 2_000_000), &HashMap::new(), 2_000, 1_000);
        assert!(intents.is_empty());
    }

    #[test]
    fn neutral_regime_yields_maker_quotes() {
        let r = router();
        let intents = r.generate_intents(&market(), &book(0.49, 0.51, 2_000_000), &ref_price(100_000.0, 0.0, 2_000_000), &HashMap::new(), 2_000, 1_000);
        assert_eq!(intents.len(), 2);
    }

    #[test]
    fn toxic_regime_suppresses_maker_quotes() {
        let r = router();
        let intents = r.generate_intents(&market(), &book(0.40, 0.51, 2_000_000), &ref_price(100_000.0, 0.0, 2_000_000), &HashMap::new(), 2_000, 1_000);
        assert!(intents.is_empty());
    }
}
