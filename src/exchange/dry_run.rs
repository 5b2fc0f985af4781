//! Simulated exchange backend used when `DRY_RUN=true`. Maker orders are
//! rejected if they would cross the current book (mirroring a real
//! post-only reject) and otherwise rest until explicitly cancelled or
//! replaced; taker orders fill immediately at the submitted price. No real
//! network calls are made.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::exchange::client::{BoxFuture, ExchangeClient};
use crate::exchange::fill_queue::FillQueue;
use crate::feeds::FeedState;
use crate::model::{OpenOrder, OrderStatus};
use crate::types::{Fill, Side};

pub struct DryRunExchange {
    feeds: FeedState,
    fills: FillQueue,
    open_orders: Mutex<HashMap<String, OpenOrder>>,
}

impl DryRunExchange {
    pub fn new(feeds: FeedState, fills: FillQueue) -> Self {
        Self { feeds, fills, open_orders: Mutex::new(HashMap::new()) }
    }

    /// `true` if a resting order at `price`/`side` would execute
    /// immediately against the current book top.
    fn would_cross(&self, token_id: &str, side: Side, price: f64) -> bool {
        let Some(book) = self.feeds.get_book(token_id) else { return false };
        match side {
            Side::Buy => book.ask_px.is_some_and(|ask| price >= ask),
            Side::Sell => book.bid_px.is_some_and(|bid| price <= bid),
        }
    }
}

impl ExchangeClient for DryRunExchange {
    fn place_order<'a>(
        &'a self,
        token_id: &'a str,
        side: Side,
        price: f64,
        size: f64,
        post_only: bool,
        client_order_id: Uuid,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let now_ms = Utc::now().timestamp_millis();

            if post_only && self.would_cross(token_id, side, price) {
                info!(token_id, ?side, price, "dry-run post-only order would cross, rejecting");
                return Ok(None);
            }

            let order_id = format!("dryrun-{client_order_id}");

            if !post_only {
                self.fills.push(Fill {
                    fill_id: format!("dryrun-fill-{client_order_id}"),
                    order_id: order_id.clone(),
                    token_id: token_id.to_string(),
                    side,
                    price,
                    size,
                    fee: 0.0,
                    ts_ms: now_ms,
                });
                info!(token_id, ?side, price, size, "dry-run taker order filled immediately");
                return Ok(Some(order_id));
            }

            let order = OpenOrder {
                order_id: order_id.clone(),
                token_id: token_id.to_string(),
                side,
                price,
                size,
                filled_size: 0.0,
                status: OrderStatus::Open,
                created_at_ms: now_ms,
            };
            self.open_orders.lock().unwrap().insert(order_id.clone(), order);
            info!(token_id, ?side, price, size, order_id = %order_id, "dry-run maker order resting");
            Ok(Some(order_id))
        })
    }

    fn cancel_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move { Ok(self.open_orders.lock().unwrap().remove(order_id).is_some()) })
    }

    fn cancel_all_orders(&self) -> BoxFuture<'_, u32> {
        Box::pin(async move {
            let mut orders = self.open_orders.lock().unwrap();
            let count = orders.len() as u32;
            orders.clear();
            Ok(count)
        })
    }

    fn list_open_orders(&self) -> BoxFuture<'_, Vec<OpenOrder>> {
        Box::pin(async move { Ok(self.open_orders.lock().unwrap().values().cloned().collect()) })
    }
}
