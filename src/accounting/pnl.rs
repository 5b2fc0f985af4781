//! Keeps per-token positions in sync with fills and reports P&L for the
//! daily-loss risk check.

use std::collections::HashMap;

use tracing::info;

use crate::model::Position;
use crate::types::Fill;

#[derive(Debug, Default)]
pub struct PnLAccountant {
    positions: HashMap<String, Position>,
}

impl PnLAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild positions from persisted rows on restart (the store is the
    /// single source of truth).
    pub fn rehydrate(positions: Vec<Position>) -> Self {
        let mut map = HashMap::new();
        for p in positions {
            map.insert(p.token_id.clone(), p);
        }
        info!(count = map.len(), "rehydrated positions from store");
        Self { positions: map }
    }

    /// Apply a fill to the relevant position, creating it if this is the
    /// first fill seen for the token.
    pub fn process_fill(&mut self, fill: &Fill) -> &Position {
        let position = self.positions.entry(fill.token_id.clone()).or_insert_with(|| Position::new(fill.token_id.clone()));
        position.apply_fill(fill);
        position
    }

    pub fn position(&self, token_id: &str) -> Option<&Position> {
        self.positions.get(token_id)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// `realized + unrealized` P&L across all tracked positions, using
    /// `mids` (token_id → mid price) for the unrealized leg. Positions with
    /// no known mid contribute only their realized P&L.
    pub fn total_pnl(&self, mids: &HashMap<String, f64>) -> f64 {
        self.positions
            .values()
            .map(|p| {
                let unrealized = mids.get(&p.token_id).map(|mid| p.unrealized_pnl(*mid)).unwrap_or(0.0);
                p.realized_pnl + unrealized
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn fill(token: &str, side: Side, price: f64, size: f64) -> Fill {
        Fill { fill_id: "f".into(), order_id: "o".into(), token_id: token.into(), side, price, size, fee: 0.0, ts_ms: 0 }
    }

    #[test]
    fn process_fill_creates_position_on_first_touch() {
        let mut acc = PnLAccountant::new();
        acc.process_fill(&fill("yes", Side::Buy, 0.40, 100.0));
        let pos = acc.position("yes").unwrap();
        assert_eq!(pos.qty, 100.0);
    }

    #[test]
    fn total_pnl_sums_realized_and_unrealized() {
        let mut acc = PnLAccountant::new();
        acc.process_fill(&fill("yes", Side::Buy, 0.40, 100.0));
        acc.process_fill(&fill("no", Side::Buy, 0.30, 50.0));

        let mut mids = HashMap::new();
        mids.insert("yes".to_string(), 0.45);
        mids.insert("no".to_string(), 0.25);

        let total = acc.total_pnl(&mids);
        assert!((total - (5.0 - 2.5)).abs() < 1e-9);
    }

    #[test]
    fn rehydrate_restores_positions_from_store() {
        let mut p = Position::new("yes");
        p.qty = 10.0;
        p.avg_cost = 0.5;
        let acc = PnLAccountant::rehydrate(vec![p]);
        assert_eq!(acc.position("yes").unwrap().qty, 10.0);
    }
}
