//! Streaming book-top feed worker, symmetrical to the price feed: connects
//! to a JSON orderbook-top websocket and publishes `BookTop` updates keyed
//! by token id. Reconnects with exponential backoff on every disconnect.

use chrono::Utc;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use crate::feeds::backoff::Backoff;
use crate::feeds::state::FeedState;
use crate::model::BookTop;

#[derive(Debug, Deserialize)]
struct BookTopMessage {
    token_id: String,
    bid_px: Option<f64>,
    bid_sz: Option<f64>,
    ask_px: Option<f64>,
    ask_sz: Option<f64>,
}

/// Runs until cancelled, reconnecting with backoff on every disconnect.
pub async fn run_book_feed(ws_url: &str, state: FeedState) -> ! {
    let mut backoff = Backoff::new();

    loop {
        match connect_async(ws_url).await {
            Ok((stream, _)) => {
                info!(url = ws_url, "book feed connected");
                backoff.reset();
                let (_sink, mut read) = stream.split();

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => handle_book_text(&text, &state),
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "book feed read error, reconnecting");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, url = ws_url, "book feed connect failed");
            }
        }

        let delay = backoff.next_delay();
        warn!(delay_s = delay.as_secs(), "reconnecting book feed");
        sleep(delay).await;
    }
}

fn handle_book_text(text: &str, state: &FeedState) {
    let Ok(parsed) = serde_json::from_str::<BookTopMessage>(text) else { return };
    state.update_book(BookTop {
        token_id: parsed.token_id,
        bid_px: parsed.bid_px,
        bid_sz: parsed.bid_sz,
        ask_px: parsed.ask_px,
        ask_sz: parsed.ask_sz,
        ts_ms: Utc::now().timestamp_millis(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_message_updates_book_top() {
        let state = FeedState::new();
        handle_book_text(r#"{"token_id":"yes","bid_px":0.48,"bid_sz":10.0,"ask_px":0.52,"ask_sz":8.0}"#, &state);
        let book = state.get_book("yes").unwrap();
        assert_eq!(book.bid_px, Some(0.48));
        assert_eq!(book.ask_px, Some(0.52));
    }

    #[test]
    fn malformed_message_is_ignored() {
        let state = FeedState::new();
        handle_book_text("not json", &state);
        assert!(state.get_book("yes").is_none());
    }
}
