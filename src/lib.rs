//! Short-dated call option screener.
//!
//! Screens an equity universe for call-option candidates that pass combined
//! technical, fundamental, and options-liquidity gates, then values the
//! selected contract with closed-form Black-Scholes Greeks.

pub mod analysis;
pub mod api;
pub mod error;
pub mod export;
pub mod models;
pub mod universe;

pub use analysis::{accepted_candidates, OptionScreener, TickerOutcome};
pub use error::{ScreenError, Stage};
pub use models::{ScreenerCriteria, ScreeningCandidate};
