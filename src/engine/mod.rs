pub mod task;

pub use task::run_engine;
