pub mod fundamentals;
pub mod greeks;
pub mod options;
pub mod screener;
pub mod technical;

pub use greeks::{black_scholes_greeks, OptionGreeks};
pub use screener::{accepted_candidates, OptionScreener, TickerOutcome};
