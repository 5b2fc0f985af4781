pub mod fair_price;
pub mod fee_model;
pub mod lag_arb;
pub mod market_maker;
pub mod router;
pub mod toxicity;

pub use fair_price::FairPriceCalculator;
pub use fee_model::FeeModel;
pub use lag_arb::LagArbStrategy;
pub use market_maker::MarketMakerStrategy;
pub use router::HybridRouter;
pub use toxicity::ToxicityDetector;
