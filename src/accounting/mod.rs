pub mod pnl;

pub use pnl::PnLAccountant;
