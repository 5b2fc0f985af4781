use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use predmarket_engine::accounting::PnLAccountant;
use predmarket_engine::config::Config;
use predmarket_engine::engine::{run_engine, task::Engine};
use predmarket_engine::exchange::{DryRunExchange, ExchangeClient, FillQueue};
use predmarket_engine::feeds::{run_book_feed, run_price_feed, FeedState};
use predmarket_engine::registry::MarketRegistry;
use predmarket_engine::risk::{KillSwitch, RateLimiter};
use predmarket_engine::store::StateStore;

fn init_logging(cfg: &Config) {
    let filter = EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::from_default_env());
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match &cfg.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path).expect("open LOG_FILE for append");
            let (writer, guard) = tracing_appender::non_blocking(file);
            // Leaked intentionally: the guard must outlive the process for
            // the non-blocking writer to flush on every log line.
            std::mem::forget(guard);
            subscriber.with_writer(writer).init();
        }
        None => subscriber.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load()?;
    init_logging(&cfg);

    tracing::info!(dry_run = cfg.execution.dry_run, loop_interval_ms = cfg.loop_interval_ms, "starting engine");

    let store = StateStore::new(cfg.db_path.clone())?;
    store.migrate()?;

    let registry = MarketRegistry::load(&cfg.market_registry_path)?;
    let accountant = PnLAccountant::rehydrate(store.load_positions()?);

    let feeds = FeedState::new();
    let fills = FillQueue::new();
    let kill_switch = Arc::new(KillSwitch::new());
    let rate_limiter = RateLimiter::new(cfg.risk.max_orders_per_min, std::time::Duration::from_secs(60));

    if cfg.kill_switch {
        kill_switch.activate("KILL_SWITCH set at startup");
    }

    let exchange: Arc<dyn ExchangeClient> = if cfg.execution.dry_run {
        Arc::new(DryRunExchange::new(feeds.clone(), fills.clone()))
    } else {
        anyhow::bail!("live exchange execution is not wired in this build; set DRY_RUN=true");
    };

    {
        let exchange = exchange.clone();
        kill_switch.register_callback(move || {
            let exchange = exchange.clone();
            tokio::spawn(async move {
                let cancelled = exchange.cancel_all_orders().await;
                match cancelled {
                    Ok(n) => tracing::warn!(cancelled = n, "kill switch cancelled all open orders"),
                    Err(err) => tracing::error!(?err, "kill switch cancel-all failed"),
                }
            });
        });
    }

    // One feed worker per underlying symbol; vendor wire symbol defaults to
    // the canonical form (out-of-scope market discovery is responsible for
    // any vendor-specific remapping).
    let symbol_map: HashMap<String, String> = registry.all().map(|m| (m.underlying_symbol.clone(), m.underlying_symbol.clone())).collect();

    {
        let feeds = feeds.clone();
        let ws_url = cfg.price_feed_ws_url.clone();
        tokio::spawn(async move {
            run_price_feed(&ws_url, symbol_map, feeds).await;
        });
    }
    {
        let feeds = feeds.clone();
        let ws_url = cfg.book_feed_ws_url.clone();
        tokio::spawn(async move {
            run_book_feed(&ws_url, feeds).await;
        });
    }

    let engine = Engine::new(cfg, registry, feeds, fills, store, accountant, kill_switch, rate_limiter, exchange);

    run_engine(engine).await;
}
