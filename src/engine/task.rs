//! Main tick loop: the single place the core's components are wired
//! together. Strategy, risk, reconciliation, and accounting run
//! sequentially within a tick so every intent sees one consistent snapshot
//! of book, position, and open-order state; feed workers, the exchange's
//! fill callback, and the rate limiter run independently and only hand data
//! to the loop through the shared state passed in here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::accounting::PnLAccountant;
use crate::config::Config;
use crate::exchange::{ExchangeClient, FillQueue};
use crate::feeds::FeedState;
use crate::model::{Decision, OpenOrder, OrderStatus, Position};
use crate::reconcile::OrderReconciler;
use crate::registry::MarketRegistry;
use crate::risk::{KillSwitch, RateLimiter, RiskContext, RiskGate};
use crate::store::StateStore;
use crate::strategy::{FairPriceCalculator, FeeModel, HybridRouter, LagArbStrategy, MarketMakerStrategy, ToxicityDetector};
use crate::types::{ExecAction, Intent, Side};

/// Everything the tick loop needs, gathered once at startup. Cheap to
/// clone: every field is either an `Arc`, a `DashMap`-backed handle, or a
/// small value type.
pub struct Engine {
    pub config: Config,
    pub registry: MarketRegistry,
    pub feeds: FeedState,
    pub fills: FillQueue,
    pub store: StateStore,
    pub accountant: PnLAccountant,
    pub kill_switch: Arc<KillSwitch>,
    pub rate_limiter: RateLimiter,
    pub exchange: Arc<dyn ExchangeClient>,
    pub router: HybridRouter,
}

impl Engine {
    pub fn new(
        config: Config,
        registry: MarketRegistry,
        feeds: FeedState,
        fills: FillQueue,
        store: StateStore,
        accountant: PnLAccountant,
        kill_switch: Arc<KillSwitch>,
        rate_limiter: RateLimiter,
        exchange: Arc<dyn ExchangeClient>,
    ) -> Self {
        let router = HybridRouter::new(
            FairPriceCalculator::new(config.strategy.sigma_floor, config.strategy.use_normal_cdf),
            LagArbStrategy::new(config.strategy.taker_edge_threshold, config.risk.max_taker_slippage, config.strategy.default_order_size),
            MarketMakerStrategy::new(
                config.strategy.maker_half_spread,
                config.strategy.default_order_size,
                config.strategy.quote_refresh_ttl_ms,
                config.strategy.inventory_skew_factor,
                config.risk.max_inventory_per_token,
            ),
            ToxicityDetector::new(config.strategy.toxicity_vol_threshold, config.strategy.toxicity_spread_threshold),
            FeeModel::new(config.strategy.fee_gas_cost_usd, config.strategy.fee_base_taker_fee, config.strategy.fee_maker_rebate),
        );

        Self { config, registry, feeds, fills, store, accountant, kill_switch, rate_limiter, exchange, router }
    }

    /// Drain queued fills into the accountant and persist the resulting
    /// position rows. Run once at the start of every tick, before any
    /// intents are generated, so strategies see post-fill inventory.
    fn absorb_fills(&mut self, now_ms: i64) {
        for fill in self.fills.drain() {
            if let Err(err) = self.store.insert_fill(&fill) {
                error!(?err, fill_id = %fill.fill_id, "failed to persist fill");
            }
            let position = self.accountant.process_fill(&fill);
            info!(token_id = %fill.token_id, qty = position.qty, avg_cost = position.avg_cost, realized_pnl = position.realized_pnl, "fill absorbed");
            if let Err(err) = self.store.upsert_position(position, now_ms) {
                error!(?err, token_id = %fill.token_id, "failed to persist position");
            }
        }
    }

    /// One full tick: absorb fills, then evaluate every active market
    /// independently (strategy -> risk -> reconcile -> dispatch).
    pub async fn run_tick(&mut self) -> anyhow::Result<()> {
        let now_ms = Utc::now().timestamp_millis();
        let now_s = now_ms / 1000;

        self.absorb_fills(now_ms);

        let mids: HashMap<String, f64> = self
            .registry
            .all()
            .filter_map(|m| self.feeds.get_book(&m.yes_token_id).and_then(|b| b.mid()).map(|mid| (m.yes_token_id.clone(), mid)))
            .collect();
        let daily_pnl = self.accountant.total_pnl(&mids);

        let positions: HashMap<String, Position> = self.accountant.positions().map(|p| (p.token_id.clone(), p.clone())).collect();

        let open_orders = self.exchange.list_open_orders().await?;

        let gate = RiskGate::new(&self.config.risk, &self.kill_switch, &self.rate_limiter);

        for market in self.registry.active(now_s) {
            let Some(book) = self.feeds.get_book(&market.yes_token_id) else {
                debug!(slug = %market.slug, "no book snapshot yet, skipping market this tick");
                continue;
            };
            let Some(ref_price) = self.feeds.get_price(&market.underlying_symbol) else {
                debug!(slug = %market.slug, symbol = %market.underlying_symbol, "no reference price yet, skipping market this tick");
                continue;
            };

            let intents = self.router.generate_intents(market, &book, &ref_price, &positions, now_s, self.config.risk.feed_stale_ms);
            if intents.is_empty() {
                continue;
            }

            let feed_is_stale = book.is_stale(now_ms, self.config.risk.feed_stale_ms) || ref_price.is_stale(now_ms, self.config.risk.feed_stale_ms);
            let position = positions.get(&market.yes_token_id);

            let mut accepted = Vec::new();
            for intent in intents {
                // `book.mid()` is a probability-unit contract price; `ref_price.spot_mid` is
                // the underlying's spot and must never stand in for it here (100000 vs 0.50
                // would blow through max_notional_per_market). When the book has no two-sided
                // mid, fall back to the intent's own probability-unit price.
                let reference_price = book.mid().unwrap_or(intent.price);
                let ctx = RiskContext {
                    feed_is_stale,
                    open_order_count: open_orders.len() as u32,
                    position,
                    reference_price,
                    realized_plus_unrealized_pnl_today: daily_pnl,
                };

                let result = gate.check(&intent, &ctx);
                let decision = Decision {
                    token_id: intent.token_id.clone(),
                    side: intent.side,
                    price: intent.price,
                    size: intent.size,
                    mode: intent.mode,
                    reason: intent.reason.clone(),
                    accepted: result.is_ok(),
                    rejection_reason: result.as_ref().err().map(|e| e.code().to_string()),
                    ts_ms: now_ms,
                };
                if let Err(err) = self.store.insert_decision(&decision) {
                    error!(?err, slug = %market.slug, "failed to persist decision");
                }

                match result {
                    Ok(()) => accepted.push(intent),
                    Err(rejection) => {
                        debug!(slug = %market.slug, %rejection, token_id = %intent.token_id, "intent rejected by risk gate");
                    }
                }
            }

            if accepted.is_empty() {
                continue;
            }

            let market_orders: Vec<OpenOrder> = open_orders.iter().filter(|o| o.token_id == market.yes_token_id).cloned().collect();
            let reconciler = OrderReconciler::new(market.tick_size);
            let actions = reconciler.reconcile(&accepted, &market_orders, now_ms);

            let mut by_key: HashMap<(String, Side, u64), &Intent> = HashMap::new();
            for intent in &accepted {
                by_key.insert((intent.token_id.clone(), intent.side, intent.price.to_bits()), intent);
            }

            for action in &actions {
                match action {
                    ExecAction::Place { token_id, side, price, size, post_only, client_order_id } => {
                        if let Some(intent) = by_key.get(&(token_id.clone(), *side, price.to_bits())).copied() {
                            gate.record_dispatch(intent);
                        }
                        match self.exchange.place_order(token_id, *side, *price, *size, *post_only, *client_order_id).await {
                            Ok(Some(order_id)) => {
                                let reason = by_key.get(&(token_id.clone(), *side, price.to_bits())).map(|i| i.reason.as_str()).unwrap_or("reconciler");
                                let order = OpenOrder {
                                    order_id: order_id.clone(),
                                    token_id: token_id.clone(),
                                    side: *side,
                                    price: *price,
                                    size: *size,
                                    filled_size: 0.0,
                                    status: OrderStatus::Open,
                                    created_at_ms: now_ms,
                                };
                                if let Err(err) = self.store.insert_order(&order, reason, now_ms) {
                                    error!(?err, order_id = %order_id, "failed to persist order");
                                }
                            }
                            Ok(None) => {
                                debug!(token_id, ?side, price, "order placement rejected by exchange (e.g. post-only would cross)");
                            }
                            Err(err) => {
                                warn!(?err, token_id, ?side, "place_order failed, will retry next tick");
                            }
                        }
                    }
                    ExecAction::Cancel { order_id } => match self.exchange.cancel_order(order_id).await {
                        Ok(true) => {
                            if let Err(err) = self.store.update_order_status(order_id, OrderStatus::Cancelled, None, now_ms) {
                                error!(?err, order_id, "failed to persist cancellation");
                            }
                        }
                        Ok(false) => warn!(order_id, "cancel_order found nothing to cancel"),
                        Err(err) => warn!(?err, order_id, "cancel_order failed, will retry next tick"),
                    },
                }
            }
        }

        Ok(())
    }
}

/// Runs forever at `config.loop_interval_ms` cadence. A failed tick is
/// logged and the loop resumes on the next cadence rather than propagating
/// the error, matching the "a stalled tick logs a warning and resumes"
/// contract.
pub async fn run_engine(mut engine: Engine) -> ! {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(engine.config.loop_interval_ms));

    loop {
        interval.tick().await;
        if let Err(err) = engine.run_tick().await {
            warn!(?err, "tick failed, resuming on next cadence");
        }
    }
}
