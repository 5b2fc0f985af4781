//! Pre-trade risk gate: a fixed-precedence chain of checks run for every
//! intent before it reaches the reconciler.

use tracing::info;

use crate::config::RiskConfig;
use crate::errors::RiskRejection;
use crate::model::Position;
use crate::risk::kill_switch::KillSwitch;
use crate::risk::rate_limiter::RateLimiter;
use crate::types::{Intent, Side};

/// Snapshot of the state the gate needs to evaluate one intent. Built
/// fresh each tick from the single consistent snapshot the core loop
/// already holds.
pub struct RiskContext<'a> {
    pub feed_is_stale: bool,
    pub open_order_count: u32,
    pub position: Option<&'a Position>,
    pub reference_price: f64,
    pub realized_plus_unrealized_pnl_today: f64,
}

/// Evaluates the fixed precedence chain from spec: kill switch, feed
/// staleness, order count, inventory, notional, daily loss, rate limit.
/// Returns the first rule that fails; later rules are never evaluated.
pub struct RiskGate<'a> {
    pub config: &'a RiskConfig,
    pub kill_switch: &'a KillSwitch,
    pub rate_limiter: &'a RateLimiter,
}

impl<'a> RiskGate<'a> {
    pub fn new(config: &'a RiskConfig, kill_switch: &'a KillSwitch, rate_limiter: &'a RateLimiter) -> Self {
        Self { config, kill_switch, rate_limiter }
    }

    /// Check `intent` against the full precedence chain. Does not consume
    /// a rate-limiter slot — that only happens once the intent is actually
    /// dispatched to the reconciler, via [`RiskGate::record_dispatch`].
    pub fn check(&self, intent: &Intent, ctx: &RiskContext) -> Result<(), RiskRejection> {
        if self.kill_switch.is_active() {
            return Err(RiskRejection::KillSwitchActive);
        }

        if ctx.feed_is_stale {
            return Err(RiskRejection::FeedStale);
        }

        if ctx.open_order_count >= self.config.max_open_orders_total {
            return Err(RiskRejection::OrderLimitExceeded);
        }

        let current_qty = ctx.position.map(|p| p.qty).unwrap_or(0.0);
        let projected_qty = match intent.side {
            Side::Buy => current_qty + intent.size,
            Side::Sell => current_qty - intent.size,
        };
        if projected_qty.abs() > self.config.max_inventory_per_token {
            return Err(RiskRejection::InventoryLimitExceeded);
        }

        let projected_notional = projected_qty.abs() * ctx.reference_price;
        if projected_notional > self.config.max_notional_per_market {
            return Err(RiskRejection::NotionalLimitExceeded);
        }

        if ctx.realized_plus_unrealized_pnl_today <= -self.config.max_daily_loss {
            self.kill_switch.activate("daily loss limit breached");
            return Err(RiskRejection::DailyLossLimitExceeded);
        }

        if self.rate_limiter.available() == 0 {
            return Err(RiskRejection::RateLimitExceeded);
        }

        Ok(())
    }

    /// Record that an accepted intent was actually dispatched, consuming
    /// one rate-limiter slot. Call once per dispatched intent, never on
    /// the accept path alone (avoids double counting against the limiter).
    pub fn record_dispatch(&self, intent: &Intent) {
        let consumed = self.rate_limiter.try_acquire();
        if !consumed {
            info!(token_id = %intent.token_id, "dispatched intent found no rate-limit slot available");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;
    use crate::types::IntentMode;
    use std::time::Duration;

    fn cfg() -> RiskConfig {
        RiskConfig {
            max_notional_per_market: 100.0,
            max_inventory_per_token: 50.0,
            max_open_orders_total: 10,
            max_orders_per_min: 30,
            max_daily_loss: 50.0,
            max_taker_slippage: 0.02,
            feed_stale_ms: 2000,
        }
    }

    fn intent(side: Side, size: f64) -> Intent {
        Intent::new("yes", side, 0.5, size, IntentMode::Maker, 3000, "test").unwrap()
    }

    #[test]
    fn kill_switch_rejects_everything() {
        let config = cfg();
        let ks = KillSwitch::new();
        ks.activate("test");
        let rl = RateLimiter::new(30, Duration::from_secs(60));
        let gate = RiskGate::new(&config, &ks, &rl);

        let ctx = RiskContext {
            feed_is_stale: false,
            open_order_count: 0,
            position: None,
            reference_price: 0.5,
            realized_plus_unrealized_pnl_today: 0.0,
        };
        assert_eq!(gate.check(&intent(Side::Buy, 10.0), &ctx), Err(RiskRejection::KillSwitchActive));
    }

    #[test]
    fn inventory_limit_checked_before_notional() {
        let config = cfg();
        let ks = KillSwitch::new();
        let rl = RateLimiter::new(30, Duration::from_secs(60));
        let gate = RiskGate::new(&config, &ks, &rl);

        let ctx = RiskContext {
            feed_is_stale: false,
            open_order_count: 0,
            position: None,
            reference_price: 0.5,
            realized_plus_unrealized_pnl_today: 0.0,
        };
        assert_eq!(gate.check(&intent(Side::Buy, 60.0), &ctx), Err(RiskRejection::InventoryLimitExceeded));
    }

    #[test]
    fn daily_loss_breach_trips_kill_switch() {
        let config = cfg();
        let ks = KillSwitch::new();
        let rl = RateLimiter::new(30, Duration::from_secs(60));
        let gate = RiskGate::new(&config, &ks, &rl);

        let ctx = RiskContext {
            feed_is_stale: false,
            open_order_count: 0,
            position: None,
            reference_price: 0.5,
            realized_plus_unrealized_pnl_today: -60.0,
        };
        let result = gate.check(&intent(Side::Buy, 1.0), &ctx);
        assert_eq!(result, Err(RiskRejection::DailyLossLimitExceeded));
        assert!(ks.is_active());
    }

    #[test]
    fn accepted_intent_does_not_consume_rate_limiter_slot() {
        let config = cfg();
        let ks = KillSwitch::new();
        let rl = RateLimiter::new(1, Duration::from_secs(60));
        let gate = RiskGate::new(&config, &ks, &rl);

        let ctx = RiskContext {
            feed_is_stale: false,
            open_order_count: 0,
            position: None,
            reference_price: 0.5,
            realized_plus_unrealized_pnl_today: 0.0,
        };
        assert!(gate.check(&intent(Side::Buy, 1.0), &ctx).is_ok());
        assert_eq!(rl.available(), 1);
    }
}
