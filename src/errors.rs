//! Typed error surfaces for the trading core.
//!
//! Startup/config failures stay `anyhow::Error` (see `config.rs`); everything
//! that can happen mid-loop and needs a match arm gets its own enum here.

use thiserror::Error;

/// Outcome of `RiskGate::check`. Each variant corresponds to one rule in the
/// fixed precedence chain (kill switch first, rate limit last). The gate
/// returns the first rule that fails; later rules are never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RiskRejection {
    #[error("kill switch is active")]
    KillSwitchActive,
    #[error("feed is stale")]
    FeedStale,
    #[error("open order count at or above limit")]
    OrderLimitExceeded,
    #[error("projected inventory exceeds per-token limit")]
    InventoryLimitExceeded,
    #[error("projected notional exceeds per-market limit")]
    NotionalLimitExceeded,
    #[error("daily loss limit breached")]
    DailyLossLimitExceeded,
    #[error("order rate limit exhausted")]
    RateLimitExceeded,
}

impl RiskRejection {
    /// Stable machine-readable tag persisted in the `decisions` table.
    pub fn code(self) -> &'static str {
        match self {
            RiskRejection::KillSwitchActive => "KILL_SWITCH_ACTIVE",
            RiskRejection::FeedStale => "FEED_STALE",
            RiskRejection::OrderLimitExceeded => "ORDER_LIMIT_EXCEEDED",
            RiskRejection::InventoryLimitExceeded => "INVENTORY_LIMIT_EXCEEDED",
            RiskRejection::NotionalLimitExceeded => "NOTIONAL_LIMIT_EXCEEDED",
            RiskRejection::DailyLossLimitExceeded => "DAILY_LOSS_LIMIT_EXCEEDED",
            RiskRejection::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        }
    }
}

/// Fatal startup/config problems. Surfaced from `main` as a non-zero exit.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("{0}")]
    Other(String),
}
