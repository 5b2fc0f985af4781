//! Small shared value types used across strategy, risk, and reconciliation.

use std::time::Instant;

/// YES/NO side of a binary outcome market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeSide {
    Yes,
    No,
}

impl OutcomeSide {
    pub fn other(self) -> OutcomeSide {
        match self {
            OutcomeSide::Yes => OutcomeSide::No,
            OutcomeSide::No => OutcomeSide::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeSide::Yes => "yes",
            OutcomeSide::No => "no",
        }
    }
}

/// Direction of an order (buy or sell of the given outcome side's token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => anyhow::bail!("unknown side {other}"),
        }
    }
}

/// Whether an intent wants to rest on the book (MAKER) or cross it
/// immediately (TAKER).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentMode {
    Taker,
    Maker,
}

impl IntentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentMode::Taker => "TAKER",
            IntentMode::Maker => "MAKER",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "TAKER" => Ok(IntentMode::Taker),
            "MAKER" => Ok(IntentMode::Maker),
            other => anyhow::bail!("unknown intent mode {other}"),
        }
    }
}

/// Desired action emitted by a strategy, before risk checks.
///
/// Invariants (enforced in `Intent::new`): `0 < price < 1`, `size > 0`.
#[derive(Debug, Clone)]
pub struct Intent {
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub mode: IntentMode,
    pub ttl_ms: u64,
    pub reason: String,
    pub created_at: Instant,
}

impl Intent {
    pub fn new(
        token_id: impl Into<String>,
        side: Side,
        price: f64,
        size: f64,
        mode: IntentMode,
        ttl_ms: u64,
        reason: impl Into<String>,
    ) -> anyhow::Result<Self> {
        if !(price > 0.0 && price < 1.0) {
            anyhow::bail!("intent price must be in (0,1), got {price}");
        }
        if !(size > 0.0) {
            anyhow::bail!("intent size must be positive, got {size}");
        }
        Ok(Self {
            token_id: token_id.into(),
            side,
            price,
            size,
            mode,
            ttl_ms,
            reason: reason.into(),
            created_at: Instant::now(),
        })
    }
}

/// Executed trade reported by the exchange.
#[derive(Debug, Clone)]
pub struct Fill {
    pub fill_id: String,
    pub order_id: String,
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub fee: f64,
    pub ts_ms: i64,
}

/// A place/cancel action the reconciler wants the exchange client to
/// perform this tick.
#[derive(Debug, Clone)]
pub enum ExecAction {
    Place {
        token_id: String,
        side: Side,
        price: f64,
        size: f64,
        post_only: bool,
        client_order_id: uuid::Uuid,
    },
    Cancel { order_id: String },
}
