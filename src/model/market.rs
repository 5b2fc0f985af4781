//! Static market definitions, loaded once from the registry and read-only
//! to the core for the lifetime of the process.

use serde::Deserialize;

/// Fee-curve market class (see `strategy::fee_model`). Most markets are
/// `Standard` (no taker fee, no maker rebate); a small class of short-window
/// markets runs a parabolic taker fee / maker rebate curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketClass {
    Standard,
    RollingWindow,
}

impl Default for MarketClass {
    fn default() -> Self {
        MarketClass::Standard
    }
}

/// Static definition of a binary-outcome market. Immutable after load.
///
/// Invariants: `tick_size > 0`, `min_size > 0`, `yes_token_id != no_token_id`.
#[derive(Debug, Clone)]
pub struct Market {
    pub slug: String,
    /// Canonical symbol (e.g. `"BTCUSDT"`) the fair-price model reads its
    /// `RefPrice` from. Market discovery (out of scope) is responsible for
    /// picking the right one; the core only consumes it.
    pub underlying_symbol: String,
    pub strike: Option<f64>,
    pub expiry_ts: i64,
    pub yes_token_id: String,
    pub no_token_id: String,
    pub tick_size: f64,
    pub min_size: f64,
    pub condition_id: Option<String>,
    pub class: MarketClass,
}

impl Market {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slug: impl Into<String>,
        underlying_symbol: impl Into<String>,
        strike: Option<f64>,
        expiry_ts: i64,
        yes_token_id: impl Into<String>,
        no_token_id: impl Into<String>,
        tick_size: f64,
        min_size: f64,
        condition_id: Option<String>,
        class: MarketClass,
    ) -> anyhow::Result<Self> {
        let yes_token_id = yes_token_id.into();
        let no_token_id = no_token_id.into();

        if !(tick_size > 0.0) {
            anyhow::bail!("tick_size must be positive");
        }
        if !(min_size > 0.0) {
            anyhow::bail!("min_size must be positive");
        }
        if yes_token_id == no_token_id {
            anyhow::bail!("yes_token_id and no_token_id must differ");
        }

        Ok(Self {
            slug: slug.into(),
            underlying_symbol: underlying_symbol.into(),
            strike,
            expiry_ts,
            yes_token_id,
            no_token_id,
            tick_size,
            min_size,
            condition_id,
            class,
        })
    }
}

/// Wire schema for one entry in the `markets` array of the registry JSON
/// file (see spec §6). Parsed then validated into a `Market`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSpec {
    pub slug: String,
    #[serde(default)]
    pub underlying_symbol: String,
    pub strike: Option<f64>,
    pub expiry_ts: i64,
    pub yes_token_id: String,
    pub no_token_id: String,
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
    #[serde(default = "default_min_size")]
    pub min_size: f64,
    pub condition_id: Option<String>,
    #[serde(default)]
    pub class: MarketClass,
}

fn default_tick_size() -> f64 {
    0.01
}

fn default_min_size() -> f64 {
    1.0
}

impl MarketSpec {
    pub fn into_market(self) -> anyhow::Result<Market> {
        Market::new(
            self.slug,
            self.underlying_symbol,
            self.strike,
            self.expiry_ts,
            self.yes_token_id,
            self.no_token_id,
            self.tick_size,
            self.min_size,
            self.condition_id,
            self.class,
        )
    }
}
