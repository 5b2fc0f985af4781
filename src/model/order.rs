//! Live order state and the decision audit trail.

use crate::types::{IntentMode, Side};

/// Lifecycle status of an order as tracked by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "open" => Ok(OrderStatus::Open),
            "partially_filled" => Ok(OrderStatus::PartiallyFilled),
            "filled" => Ok(OrderStatus::Filled),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "rejected" => Ok(OrderStatus::Rejected),
            other => anyhow::bail!("unknown order status {other}"),
        }
    }
}

/// An order the reconciler believes is live on the exchange.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub order_id: String,
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub filled_size: f64,
    pub status: OrderStatus,
    pub created_at_ms: i64,
}

impl OpenOrder {
    pub fn remaining_size(&self) -> f64 {
        (self.size - self.filled_size).max(0.0)
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.created_at_ms).max(0)
    }
}

/// Aggregated risk posture at a point in time, computed from persisted
/// orders/fills/positions rather than tracked incrementally. Read-only: the
/// gate itself checks limits against live in-memory state, this is the
/// queryable snapshot for dashboards and post-hoc review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    pub total_notional: f64,
    pub max_position_notional: f64,
    pub num_open_orders: u32,
    pub daily_pnl: f64,
    pub daily_taker_volume: f64,
    pub orders_last_minute: u32,
}

/// Audit record of one strategy decision, accepted or rejected, persisted
/// for replay and post-hoc analysis.
#[derive(Debug, Clone)]
pub struct Decision {
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub mode: IntentMode,
    pub reason: String,
    pub accepted: bool,
    pub rejection_reason: Option<String>,
    pub ts_ms: i64,
}
