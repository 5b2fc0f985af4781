//! The exchange trading client is consumed through a narrow trait so the
//! core loop never depends on a specific venue SDK. Methods return boxed
//! futures (rather than `async fn` in a trait) so the trait stays object
//! safe — the loop holds a `Box<dyn ExchangeClient>` chosen at startup by
//! `DRY_RUN`.

use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use crate::model::OpenOrder;
use crate::types::Side;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// `place_order` returns the exchange-assigned order id, or `None` if the
/// order was rejected (e.g. a post-only order that would have crossed).
pub trait ExchangeClient: Send + Sync {
    fn place_order<'a>(
        &'a self,
        token_id: &'a str,
        side: Side,
        price: f64,
        size: f64,
        post_only: bool,
        client_order_id: Uuid,
    ) -> BoxFuture<'a, Option<String>>;

    fn cancel_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, bool>;

    fn cancel_all_orders(&self) -> BoxFuture<'_, u32>;

    fn list_open_orders(&self) -> BoxFuture<'_, Vec<OpenOrder>>;
}
