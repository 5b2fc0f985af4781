//! Auxiliary feed workers: independent producers that stream from an
//! exchange-side collaborator and publish into shared, mutex-free
//! (DashMap-backed) state the core loop reads from. Each worker owns its
//! reconnect policy; only the loop thread reads the published maps when
//! computing intents.

pub mod backoff;
pub mod book_feed;
pub mod price_feed;
pub mod returns;
pub mod state;

pub use backoff::Backoff;
pub use book_feed::run_book_feed;
pub use price_feed::run_price_feed;
pub use returns::RollingReturns;
pub use state::FeedState;
