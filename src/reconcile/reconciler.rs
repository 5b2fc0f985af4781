//! Translates a desired intent set into the minimum sequence of
//! place/cancel actions against the live open-order set.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::model::OpenOrder;
use crate::types::{ExecAction, Intent, IntentMode, Side};

/// `ε_price` (price proximity) and size tolerance are fixed per spec: one
/// tick's worth of drift and 10% size tolerance.
pub struct OrderReconciler {
    pub price_epsilon: f64,
    pub size_tolerance_pct: f64,
}

impl OrderReconciler {
    pub fn new(price_epsilon: f64) -> Self {
        Self { price_epsilon, size_tolerance_pct: 0.10 }
    }

    fn matches(&self, order: &OpenOrder, intent: &Intent, now_ms: i64) -> bool {
        if (order.price - intent.price).abs() > self.price_epsilon {
            return false;
        }
        let size_diff_pct = (order.remaining_size() - intent.size).abs() / intent.size;
        if size_diff_pct > self.size_tolerance_pct {
            return false;
        }
        if intent.mode == IntentMode::Maker && order.age_ms(now_ms) as u64 > intent.ttl_ms {
            return false;
        }
        true
    }

    /// Diff `intents` against `open_orders` (the exchange-reported live set,
    /// snapshotted at tick start) and produce the actions needed to bring
    /// the book in line. With stable inputs this converges to zero actions.
    pub fn reconcile(&self, intents: &[Intent], open_orders: &[OpenOrder], now_ms: i64) -> Vec<ExecAction> {
        let mut actions = Vec::new();

        let mut buckets: HashMap<(String, Side), Vec<&OpenOrder>> = HashMap::new();
        for order in open_orders {
            buckets.entry((order.token_id.clone(), order.side)).or_default().push(order);
        }

        let mut seen_keys = std::collections::HashSet::new();

        for intent in intents {
            let key = (intent.token_id.clone(), intent.side);
            seen_keys.insert(key.clone());
            let bucket = buckets.entry(key).or_default();

            if intent.mode == IntentMode::Taker {
                actions.push(place_action(intent));
                info!(token_id = %intent.token_id, ?intent.side, "placing taker order");
                continue;
            }

            if let Some(pos) = bucket.iter().position(|o| self.matches(o, intent, now_ms)) {
                let kept = bucket.remove(pos);
                debug!(order_id = %kept.order_id, "keeping matching maker order");
                continue;
            }

            for stale in bucket.drain(..) {
                actions.push(ExecAction::Cancel { order_id: stale.order_id.clone() });
            }
            actions.push(place_action(intent));
            info!(token_id = %intent.token_id, ?intent.side, "replacing maker order");
        }

        for (key, remaining) in buckets {
            if seen_keys.contains(&key) {
                continue;
            }
            for order in remaining {
                actions.push(ExecAction::Cancel { order_id: order.order_id.clone() });
            }
        }

        actions
    }
}

fn place_action(intent: &Intent) -> ExecAction {
    ExecAction::Place {
        token_id: intent.token_id.clone(),
        side: intent.side,
        price: intent.price,
        size: intent.size,
        post_only: intent.mode == IntentMode::Maker,
        client_order_id: Uuid::new_v4(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderStatus;

    fn intent(token: &str, side: Side, price: f64, size: f64, mode: IntentMode, ttl_ms: u64) -> Intent {
        Intent::new(token, side, price, size, mode, ttl_ms, "test").unwrap()
    }

    fn order(token: &str, side: Side, price: f64, size: f64, filled: f64, created_at_ms: i64) -> OpenOrder {
        OpenOrder {
            order_id: format!("{token}-{side:?}-{price}"),
            token_id: token.to_string(),
            side,
            price,
            size,
            filled_size: filled,
            status: OrderStatus::Open,
            created_at_ms,
        }
    }

    #[test]
    fn taker_always_places_fresh_never_reuses() {
        let r = OrderReconciler::new(0.01);
        let intents = vec![intent("yes", Side::Buy, 0.51, 10.0, IntentMode::Taker, 1000)];
        let open = vec![order("yes", Side::Buy, 0.51, 10.0, 0.0, 0)];
        let actions = r.reconcile(&intents, &open, 1000);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], ExecAction::Place { .. }));
    }

    #[test]
    fn matching_maker_order_is_kept_with_no_actions() {
        let r = OrderReconciler::new(0.01);
        let intents = vec![intent("yes", Side::Buy, 0.50, 10.0, IntentMode::Maker, 3000)];
        let open = vec![order("yes", Side::Buy, 0.505, 10.0, 0.0, 0)];
        let actions = r.reconcile(&intents, &open, 500);
        assert!(actions.is_empty());
    }

    #[test]
    fn drifted_price_triggers_cancel_and_replace() {
        let r = OrderReconciler::new(0.01);
        let intents = vec![intent("yes", Side::Buy, 0.55, 10.0, IntentMode::Maker, 3000)];
        let open = vec![order("yes", Side::Buy, 0.50, 10.0, 0.0, 0)];
        let actions = r.reconcile(&intents, &open, 500);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], ExecAction::Cancel { .. }));
        assert!(matches!(actions[1], ExecAction::Place { .. }));
    }

    #[test]
    fn expired_ttl_triggers_replace() {
        let r = OrderReconciler::new(0.01);
        let intents = vec![intent("yes", Side::Buy, 0.50, 10.0, IntentMode::Maker, 1000)];
        let open = vec![order("yes", Side::Buy, 0.50, 10.0, 0.0, 0)];
        let actions = r.reconcile(&intents, &open, 5000);
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn orphaned_order_with_no_intent_is_cancelled() {
        let r = OrderReconciler::new(0.01);
        let intents: Vec<Intent> = vec![];
        let open = vec![order("yes", Side::Buy, 0.50, 10.0, 0.0, 0)];
        let actions = r.reconcile(&intents, &open, 500);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], ExecAction::Cancel { .. }));
    }
}
