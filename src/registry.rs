//! Market registry — loads static market definitions from a JSON file.
//!
//! JSON schema:
//! ```json
//! {
//!   "markets": [
//!     {
//!       "slug": "btc-above-100k-by-feb-2026",
//!       "strike": 100000,
//!       "expiry_ts": 1738368000,
//!       "yes_token_id": "0x123...",
//!       "no_token_id": "0x456...",
//!       "tick_size": 0.01,
//!       "min_size": 1.0,
//!       "condition_id": "0xabc..."
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::market::{Market, MarketSpec};

#[derive(serde::Deserialize)]
struct RegistryFile {
    #[serde(default)]
    markets: Vec<MarketSpec>,
}

/// Read-only lookup table of markets, keyed by slug and by token id.
#[derive(Debug, Clone, Default)]
pub struct MarketRegistry {
    by_slug: HashMap<String, Market>,
    token_to_slug: HashMap<String, String>,
}

impl MarketRegistry {
    /// Load markets from `path`. A missing file is not an error — the bot
    /// starts with an empty registry and trades nothing until one is
    /// dropped in place.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "market registry not found, starting empty");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading market registry at {}", path.display()))?;
        let parsed: RegistryFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing market registry JSON at {}", path.display()))?;

        let mut registry = Self::default();
        for spec in parsed.markets {
            let market = spec.into_market().context("invalid market in registry")?;
            registry.token_to_slug.insert(market.yes_token_id.clone(), market.slug.clone());
            registry.token_to_slug.insert(market.no_token_id.clone(), market.slug.clone());
            registry.by_slug.insert(market.slug.clone(), market);
        }

        info!(count = registry.by_slug.len(), path = %path.display(), "loaded market registry");
        Ok(registry)
    }

    pub fn get(&self, slug: &str) -> Option<&Market> {
        self.by_slug.get(slug)
    }

    pub fn get_by_token(&self, token_id: &str) -> Option<&Market> {
        self.token_to_slug.get(token_id).and_then(|slug| self.by_slug.get(slug))
    }

    pub fn all(&self) -> impl Iterator<Item = &Market> {
        self.by_slug.values()
    }

    /// Markets whose `expiry_ts` is still in the future relative to `now_ts`.
    pub fn active(&self, now_ts: i64) -> impl Iterator<Item = &Market> {
        self.by_slug.values().filter(move |m| m.expiry_ts > now_ts)
    }

    /// Re-read the registry file in place, replacing the current contents.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }
}
