//! The exchange trading client, treated as an external collaborator behind
//! a narrow trait (`ExchangeClient`). `dry_run` is the simulated backend
//! used for `DRY_RUN=true`; a live backend would implement the same trait
//! against a venue SDK.

pub mod client;
pub mod dry_run;
pub mod fill_queue;

pub use client::ExchangeClient;
pub use dry_run::DryRunExchange;
pub use fill_queue::FillQueue;
