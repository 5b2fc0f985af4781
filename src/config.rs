//! Configuration loader and validator.
//!
//! Everything is read from the process environment (optionally via a
//! `.env` file) at startup, then validated once. After `Config::load()`
//! returns, configuration is immutable for the lifetime of the process.

use std::env;

use crate::errors::ValidationError;

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub maker_half_spread: f64,
    pub taker_edge_threshold: f64,
    pub quote_refresh_ttl_ms: u64,
    pub inventory_skew_factor: f64,
    pub sigma_floor: f64,
    pub use_normal_cdf: bool,
    pub default_order_size: f64,
    pub toxicity_vol_threshold: f64,
    pub toxicity_spread_threshold: f64,
    pub fee_gas_cost_usd: f64,
    pub fee_base_taker_fee: f64,
    pub fee_maker_rebate: f64,
}

#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub max_notional_per_market: f64,
    pub max_inventory_per_token: f64,
    pub max_open_orders_total: u32,
    pub max_orders_per_min: u32,
    pub max_daily_loss: f64,
    pub max_taker_slippage: f64,
    pub feed_stale_ms: i64,
}

#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub dry_run: bool,
    pub private_key: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_passphrase: Option<String>,
    pub chain_id: u64,
    pub clob_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub execution: ExecutionConfig,
    pub log_level: String,
    pub log_file: Option<String>,
    pub db_path: String,
    pub market_registry_path: String,
    pub loop_interval_ms: u64,
    pub kill_switch: bool,
    pub price_feed_ws_url: String,
    pub book_feed_ws_url: String,
}

fn get_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_string(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

fn get_float(key: &str, default: f64) -> Result<f64, ValidationError> {
    match get_env(key) {
        None => Ok(default),
        Some(v) => v.parse::<f64>().map_err(|_| ValidationError::InvalidValue {
            key: key.to_string(),
            value: v,
        }),
    }
}

fn get_int<T>(key: &str, default: T) -> Result<T, ValidationError>
where
    T: std::str::FromStr,
{
    match get_env(key) {
        None => Ok(default),
        Some(v) => v.parse::<T>().map_err(|_| ValidationError::InvalidValue {
            key: key.to_string(),
            value: v,
        }),
    }
}

fn get_bool(key: &str, default: bool) -> bool {
    match get_env(key) {
        None => default,
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    }
}

impl Config {
    /// Load and validate configuration from the environment, applying a
    /// `.env` file in the working directory if one is present.
    ///
    /// `PRIVATE_KEY` is only required when `DRY_RUN` is false — paper
    /// trading never touches a signing key.
    pub fn load() -> Result<Self, ValidationError> {
        dotenv::dotenv().ok();

        let strategy = StrategyConfig {
            maker_half_spread: get_float("MAKER_HALF_SPREAD", 0.01)?,
            taker_edge_threshold: get_float("TAKER_EDGE_THRESHOLD", 0.03)?,
            quote_refresh_ttl_ms: get_int("QUOTE_REFRESH_TTL_MS", 3000)?,
            inventory_skew_factor: get_float("INVENTORY_SKEW_FACTOR", 0.0001)?,
            sigma_floor: get_float("SIGMA_FLOOR", 0.001)?,
            use_normal_cdf: get_bool("USE_NORMAL_CDF", true),
            default_order_size: get_float("DEFAULT_ORDER_SIZE", 10.0)?,
            toxicity_vol_threshold: get_float("TOXICITY_VOL_THRESHOLD", 0.01)?,
            toxicity_spread_threshold: get_float("TOXICITY_SPREAD_THRESHOLD", 0.05)?,
            fee_gas_cost_usd: get_float("FEE_GAS_COST_USD", 0.01)?,
            fee_base_taker_fee: get_float("FEE_BASE_TAKER_FEE", 0.02)?,
            fee_maker_rebate: get_float("FEE_MAKER_REBATE", 0.002)?,
        };

        let risk = RiskConfig {
            max_notional_per_market: get_float("MAX_NOTIONAL_PER_MARKET", 100.0)?,
            max_inventory_per_token: get_float("MAX_INVENTORY_PER_TOKEN", 500.0)?,
            max_open_orders_total: get_int("MAX_OPEN_ORDERS_TOTAL", 10)?,
            max_orders_per_min: get_int("MAX_ORDERS_PER_MIN", 30)?,
            max_daily_loss: get_float("MAX_DAILY_LOSS", 50.0)?,
            max_taker_slippage: get_float("MAX_TAKER_SLIPPAGE", 0.02)?,
            feed_stale_ms: get_int("FEED_STALE_MS", 2000)?,
        };

        let dry_run = get_bool("DRY_RUN", true);
        let private_key = get_string("PRIVATE_KEY", "");
        if !dry_run && private_key.is_empty() {
            return Err(ValidationError::MissingEnv("PRIVATE_KEY".to_string()));
        }

        let execution = ExecutionConfig {
            dry_run,
            private_key,
            api_key: get_env("API_KEY"),
            api_secret: get_env("API_SECRET"),
            api_passphrase: get_env("API_PASSPHRASE"),
            chain_id: get_int("CHAIN_ID", 137)?,
            clob_url: get_string("CLOB_URL", "https://clob.polymarket.com"),
        };

        Ok(Config {
            strategy,
            risk,
            execution,
            log_level: get_string("LOG_LEVEL", "info"),
            log_file: get_env("LOG_FILE"),
            db_path: get_string("DB_PATH", "bot_state.db"),
            market_registry_path: get_string("MARKET_REGISTRY_PATH", "markets.json"),
            loop_interval_ms: get_int("LOOP_INTERVAL_MS", 500)?,
            kill_switch: get_bool("KILL_SWITCH", false),
            price_feed_ws_url: get_string("PRICE_FEED_WS_URL", "wss://stream.example.com/prices"),
            book_feed_ws_url: get_string("BOOK_FEED_WS_URL", "wss://stream.example.com/book"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_load_in_dry_run_without_private_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("PRIVATE_KEY");
        env::remove_var("DRY_RUN");
        let cfg = Config::load().expect("defaults should validate");
        assert!(cfg.execution.dry_run);
        assert_eq!(cfg.risk.max_open_orders_total, 10);
    }

    #[test]
    fn live_mode_requires_private_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("DRY_RUN", "false");
        env::remove_var("PRIVATE_KEY");
        let result = Config::load();
        env::remove_var("DRY_RUN");
        assert!(matches!(result, Err(ValidationError::MissingEnv(_))));
    }

    #[test]
    fn invalid_float_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("MAKER_HALF_SPREAD", "not-a-number");
        let result = Config::load();
        env::remove_var("MAKER_HALF_SPREAD");
        assert!(matches!(result, Err(ValidationError::InvalidValue { .. })));
    }
}
