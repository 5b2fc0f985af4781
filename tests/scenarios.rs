//! End-to-end scenario tests against the literal inputs/outputs a reviewer
//! would check by hand: one maker quote set, one taker crossing, one
//! below-threshold fallback to maker, one inventory-driven rejection
//! (with its audit row), and the two reconciler diff/replace cases.

use std::collections::HashMap;

use predmarket_engine::model::{BookTop, Market, MarketClass, OpenOrder, OrderStatus, Position};
use predmarket_engine::reconcile::OrderReconciler;
use predmarket_engine::risk::{KillSwitch, RateLimiter, RiskContext, RiskGate};
use predmarket_engine::store::StateStore;
use predmarket_engine::strategy::{FeeModel, LagArbStrategy, MarketMakerStrategy};
use predmarket_engine::types::{ExecAction, Intent, IntentMode, Side};

fn market() -> Market {
    Market::new("m", "BTCUSDT", Some(100_000.0), 2_000, "yes", "no", 0.01, 1.0, None, MarketClass::Standard).unwrap()
}

fn zero_cost_fees() -> FeeModel {
    FeeModel::new(0.0, 0.0, 0.0)
}

/// Scenario 1: maker quotes, neutral inventory.
#[test]
fn maker_quotes_neutral() {
    let strat = MarketMakerStrategy::new(0.02, 10.0, 3_000, 0.0004, 500.0);
    let intents = strat.generate_intents(&market(), 0.50, &HashMap::new(), &zero_cost_fees());

    assert_eq!(intents.len(), 2);
    let bid = intents.iter().find(|i| i.side == Side::Buy).unwrap();
    let ask = intents.iter().find(|i| i.side == Side::Sell).unwrap();
    assert!((bid.price - 0.48).abs() < 1e-9);
    assert!((ask.price - 0.52).abs() < 1e-9);
    assert_eq!(bid.mode, IntentMode::Maker);
    assert_eq!(ask.mode, IntentMode::Maker);
    assert_eq!(bid.ttl_ms, 3_000);
    assert_eq!(ask.ttl_ms, 3_000);
}

/// Scenario 2: taker triggered by a large lag-arb edge.
#[test]
fn taker_triggered_crosses_the_ask() {
    let strat = LagArbStrategy::new(0.03, 0.05, 10.0);
    let book = BookTop { token_id: "yes".into(), bid_px: Some(0.50), bid_sz: Some(20.0), ask_px: Some(0.52), ask_sz: Some(20.0), ts_ms: 0 };

    let intents = strat.generate_intents(&market(), &book, 0.60, &zero_cost_fees());

    assert_eq!(intents.len(), 1);
    let intent = &intents[0];
    assert_eq!(intent.side, Side::Buy);
    assert!((intent.price - 0.52).abs() < 1e-9);
    assert!((intent.size - 10.0).abs() < 1e-9);
    assert_eq!(intent.mode, IntentMode::Taker);
}

/// Scenario 3: edge below the taker threshold falls through to maker quotes.
#[test]
fn below_threshold_falls_back_to_maker_quotes() {
    let lag_arb = LagArbStrategy::new(0.03, 0.05, 10.0);
    let book = BookTop { token_id: "yes".into(), bid_px: Some(0.49), bid_sz: Some(20.0), ask_px: Some(0.51), ask_sz: Some(20.0), ts_ms: 0 };
    let taker_intents = lag_arb.generate_intents(&market(), &book, 0.51, &zero_cost_fees());
    assert!(taker_intents.is_empty());

    let maker = MarketMakerStrategy::new(0.02, 10.0, 3_000, 0.0004, 500.0);
    let maker_intents = maker.generate_intents(&market(), 0.51, &HashMap::new(), &zero_cost_fees());
    assert_eq!(maker_intents.len(), 2);
}

/// Scenario 4: a position already near the inventory cap rejects a same-side
/// buy, and the rejection is persisted to the decision audit trail.
#[test]
fn inventory_limit_rejects_and_logs_decision() {
    let config = predmarket_engine::config::RiskConfig {
        max_notional_per_market: 1_000.0,
        max_inventory_per_token: 100.0,
        max_open_orders_total: 10,
        max_orders_per_min: 30,
        max_daily_loss: 50.0,
        max_taker_slippage: 0.02,
        feed_stale_ms: 2_000,
    };
    let kill_switch = KillSwitch::new();
    let rate_limiter = RateLimiter::new(30, std::time::Duration::from_secs(60));
    let gate = RiskGate::new(&config, &kill_switch, &rate_limiter);

    let mut position = Position::new("yes");
    position.qty = 90.0;
    position.avg_cost = 0.5;

    let intent = Intent::new("yes", Side::Buy, 0.50, 20.0, IntentMode::Maker, 3_000, "test").unwrap();
    let ctx = RiskContext {
        feed_is_stale: false,
        open_order_count: 0,
        position: Some(&position),
        reference_price: 0.5,
        realized_plus_unrealized_pnl_today: 0.0,
    };

    let result = gate.check(&intent, &ctx);
    assert_eq!(result, Err(predmarket_engine::errors::RiskRejection::InventoryLimitExceeded));

    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    std::mem::forget(file);
    let store = StateStore::new(path).unwrap();
    store.migrate().unwrap();

    let decision = predmarket_engine::model::Decision {
        token_id: intent.token_id.clone(),
        side: intent.side,
        price: intent.price,
        size: intent.size,
        mode: intent.mode,
        reason: intent.reason.clone(),
        accepted: result.is_ok(),
        rejection_reason: result.as_ref().err().map(|e| e.code().to_string()),
        ts_ms: 0,
    };
    store.insert_decision(&decision).unwrap();

    let metrics = store.risk_metrics(0).unwrap();
    assert_eq!(metrics.num_open_orders, 0);
}

/// Scenario 5: an open maker order within price/size/ttl tolerance is reused
/// with no reconciler actions.
#[test]
fn reconciler_reuses_matching_open_order() {
    let reconciler = OrderReconciler::new(0.01);
    let intents = vec![Intent::new("yes", Side::Buy, 0.48, 10.0, IntentMode::Maker, 3_000, "mm_bid").unwrap()];
    let open = vec![OpenOrder {
        order_id: "o1".into(),
        token_id: "yes".into(),
        side: Side::Buy,
        price: 0.48,
        size: 10.0,
        filled_size: 0.0,
        status: OrderStatus::Open,
        created_at_ms: 0,
    }];

    let actions = reconciler.reconcile(&intents, &open, 500);
    assert!(actions.is_empty());
}

/// Scenario 6: a price drift beyond one tick triggers cancel-then-replace.
#[test]
fn reconciler_replaces_on_price_drift() {
    let reconciler = OrderReconciler::new(0.01);
    let intents = vec![Intent::new("yes", Side::Buy, 0.49, 10.0, IntentMode::Maker, 3_000, "mm_bid").unwrap()];
    let open = vec![OpenOrder {
        order_id: "o1".into(),
        token_id: "yes".into(),
        side: Side::Buy,
        price: 0.47,
        size: 10.0,
        filled_size: 0.0,
        status: OrderStatus::Open,
        created_at_ms: 0,
    }];

    let actions = reconciler.reconcile(&intents, &open, 500);
    assert_eq!(actions.len(), 2);
    assert!(matches!(&actions[0], ExecAction::Cancel { order_id } if order_id == "o1"));
    assert!(matches!(&actions[1], ExecAction::Place { price, .. } if (*price - 0.49).abs() < 1e-9));
}

/// Reconciler idempotence: diffing an already-reconciled order set a second
/// time against its own output yields no further actions.
#[test]
fn reconciler_is_idempotent() {
    let reconciler = OrderReconciler::new(0.01);
    let intents = vec![Intent::new("yes", Side::Buy, 0.49, 10.0, IntentMode::Maker, 3_000, "mm_bid").unwrap()];
    let open = vec![OpenOrder {
        order_id: "o1".into(),
        token_id: "yes".into(),
        side: Side::Buy,
        price: 0.47,
        size: 10.0,
        filled_size: 0.0,
        status: OrderStatus::Open,
        created_at_ms: 0,
    }];

    let first_pass = reconciler.reconcile(&intents, &open, 500);
    assert_eq!(first_pass.len(), 2);

    let replaced_order_id = match &first_pass[1] {
        ExecAction::Place { .. } => "o2".to_string(),
        _ => panic!("expected a place action"),
    };
    let converged_open = vec![OpenOrder {
        order_id: replaced_order_id,
        token_id: "yes".into(),
        side: Side::Buy,
        price: 0.49,
        size: 10.0,
        filled_size: 0.0,
        status: OrderStatus::Open,
        created_at_ms: 500,
    }];

    let second_pass = reconciler.reconcile(&intents, &converged_open, 500);
    assert!(second_pass.is_empty());
}
