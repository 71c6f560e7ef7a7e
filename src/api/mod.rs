use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::error::ScreenError;
use crate::models::{Fundamentals, OptionContract, PricePoint};

pub mod yahoo_client;
pub use yahoo_client::YahooFinanceClient;

/// Simple rate limiter for API requests
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Narrow seam between the screening core and any market-data backend.
///
/// Implementations return `ScreenError::DataUnavailable` for transport or
/// payload problems; the orchestrator treats those as per-ticker rejections,
/// never batch failures.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars, ascending by date. May be empty or short; the caller
    /// decides whether that is enough history.
    async fn fetch_price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Vec<PricePoint>, ScreenError>;

    /// Beta plus most-recent-first revenue and EPS series.
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ScreenError>;

    /// Listed option expiries, ascending.
    async fn list_expiries(&self, ticker: &str) -> Result<Vec<NaiveDate>, ScreenError>;

    /// Call contracts for one (ticker, expiry) chain.
    async fn fetch_option_chain(
        &self,
        ticker: &str,
        expiry: NaiveDate,
    ) -> Result<Vec<OptionContract>, ScreenError>;
}
