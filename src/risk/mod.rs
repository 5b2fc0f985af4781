pub mod gate;
pub mod kill_switch;
pub mod rate_limiter;

pub use gate::{RiskContext, RiskGate};
pub use kill_switch::KillSwitch;
pub use rate_limiter::RateLimiter;
