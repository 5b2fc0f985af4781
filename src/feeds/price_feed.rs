//! Streaming price-feed worker. Connects to a JSON ticker websocket, maps
//! vendor symbols to the canonical form the rest of the engine uses, and
//! publishes `RefPrice` updates into shared state. Reconnects with
//! exponential backoff on every disconnect.

use std::collections::HashMap;

use chrono::Utc;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use crate::feeds::backoff::Backoff;
use crate::feeds::returns::RollingReturns;
use crate::feeds::state::FeedState;
use crate::model::RefPrice;

/// One ticker update on the wire. Vendor-specific envelopes are adapted to
/// this shape upstream of this worker; this is the canonical form the rest
/// of the engine depends on.
#[derive(Debug, Deserialize)]
struct TickerMessage {
    symbol: String,
    price: f64,
}

/// Runs until cancelled, reconnecting with backoff on every disconnect.
/// `symbol_map` maps vendor wire symbols (e.g. `"XBT/USDT"`) to the
/// canonical symbol (e.g. `"BTCUSDT"`); unmapped symbols are ignored.
pub async fn run_price_feed(ws_url: &str, symbol_map: HashMap<String, String>, state: FeedState) -> ! {
    let mut backoff = Backoff::new();
    let mut returns: HashMap<String, RollingReturns> = HashMap::new();

    loop {
        match connect_async(ws_url).await {
            Ok((stream, _)) => {
                info!(url = ws_url, "price feed connected");
                backoff.reset();
                let (_sink, mut read) = stream.split();

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => handle_ticker_text(&text, &symbol_map, &mut returns, &state),
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "price feed read error, reconnecting");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, url = ws_url, "price feed connect failed");
            }
        }

        let delay = backoff.next_delay();
        warn!(delay_s = delay.as_secs(), "reconnecting price feed");
        sleep(delay).await;
    }
}

fn handle_ticker_text(text: &str, symbol_map: &HashMap<String, String>, returns: &mut HashMap<String, RollingReturns>, state: &FeedState) {
    let Ok(parsed) = serde_json::from_str::<TickerMessage>(text) else { return };
    let Some(canonical) = symbol_map.get(&parsed.symbol) else { return };

    let now_ms = Utc::now().timestamp_millis();
    let entry = returns.entry(canonical.clone()).or_default();
    let (r_1s, r_5s, vol_30s) = entry.push(now_ms, parsed.price);

    state.update_price(RefPrice {
        symbol: canonical.clone(),
        spot_mid: parsed.price,
        r_1s,
        r_5s,
        vol_30s,
        ts_ms: now_ms,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_vendor_symbol_is_ignored() {
        let state = FeedState::new();
        let mut returns = HashMap::new();
        let map = HashMap::from([("XBT/USDT".to_string(), "BTCUSDT".to_string())]);

        handle_ticker_text(r#"{"symbol":"ETH/USDT","price":2500.0}"#, &map, &mut returns, &state);
        assert!(state.get_price("BTCUSDT").is_none());

        handle_ticker_text(r#"{"symbol":"XBT/USDT","price":64000.0}"#, &map, &mut returns, &state);
        assert_eq!(state.get_price("BTCUSDT").unwrap().spot_mid, 64000.0);
    }
}
