//! Shared maps feed workers publish into and the loop reads from: a
//! `symbol -> RefPrice` map and a `token_id -> BookTop` map, each protected
//! by its own concurrent map so a slow reader never blocks a writer on an
//! unrelated key.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::{BookTop, RefPrice};

#[derive(Clone, Default)]
pub struct FeedState {
    prices: Arc<DashMap<String, RefPrice>>,
    books: Arc<DashMap<String, BookTop>>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_price(&self, price: RefPrice) {
        self.prices.insert(price.symbol.clone(), price);
    }

    pub fn get_price(&self, symbol: &str) -> Option<RefPrice> {
        self.prices.get(symbol).map(|r| r.clone())
    }

    pub fn update_book(&self, book: BookTop) {
        self.books.insert(book.token_id.clone(), book);
    }

    pub fn get_book(&self, token_id: &str) -> Option<BookTop> {
        self.books.get(token_id).map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_price_and_book_by_key() {
        let state = FeedState::new();
        assert!(state.get_price("BTCUSDT").is_none());

        state.update_price(RefPrice { symbol: "BTCUSDT".into(), spot_mid: 100.0, r_1s: 0.0, r_5s: 0.0, vol_30s: 0.01, ts_ms: 1 });
        assert_eq!(state.get_price("BTCUSDT").unwrap().spot_mid, 100.0);

        state.update_book(BookTop { token_id: "yes".into(), bid_px: Some(0.4), bid_sz: Some(1.0), ask_px: Some(0.5), ask_sz: Some(1.0), ts_ms: 1 });
        assert_eq!(state.get_book("yes").unwrap().bid_px, Some(0.4));
    }
}
