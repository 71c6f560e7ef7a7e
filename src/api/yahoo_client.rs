//! Yahoo Finance market-data provider.
//!
//! Uses the public v8 chart, v7 options, and v10 quoteSummary endpoints.
//! Payloads are navigated as `serde_json::Value`; missing or malformed
//! fields degrade to absent data rather than hard failures.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::ScreenError;
use crate::models::{Fundamentals, OptionContract, PricePoint};

use super::{ApiRateLimiter, MarketDataProvider};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

pub struct YahooFinanceClient {
    client: Client,
    rate_limiter: ApiRateLimiter,
}

impl YahooFinanceClient {
    pub fn new(requests_per_minute: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("call-screener/0.1")
            .build()?;

        Ok(Self {
            client,
            rate_limiter: ApiRateLimiter::new(requests_per_minute),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, ScreenError> {
        self.rate_limiter.wait().await;
        debug!("Making request to: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ScreenError::unavailable)?;

        if !response.status().is_success() {
            return Err(ScreenError::DataUnavailable(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        response.json().await.map_err(ScreenError::unavailable)
    }
}

/// Pull `{"raw": <number>}` out of a quoteSummary field.
fn raw_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(|v| v.get("raw")).and_then(|v| v.as_f64())
}

fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

fn parse_contract(obj: &Value) -> Option<OptionContract> {
    Some(OptionContract {
        strike: obj.get("strike").and_then(|v| v.as_f64())?,
        bid: obj.get("bid").and_then(|v| v.as_f64()).unwrap_or(0.0),
        ask: obj.get("ask").and_then(|v| v.as_f64()).unwrap_or(0.0),
        last_price: obj.get("lastPrice").and_then(|v| v.as_f64()).unwrap_or(0.0),
        open_interest: obj.get("openInterest").and_then(|v| v.as_i64()).unwrap_or(0),
        volume: obj.get("volume").and_then(|v| v.as_i64()).unwrap_or(0),
        implied_volatility: obj
            .get("impliedVolatility")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
    })
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Vec<PricePoint>, ScreenError> {
        let url = format!(
            "{}/{}?range={}d&interval=1d",
            CHART_URL, ticker, lookback_days
        );
        let data = self.get_json(&url).await?;

        let result = data
            .pointer("/chart/result/0")
            .ok_or_else(|| ScreenError::DataUnavailable(format!("no chart data for {}", ticker)))?;

        let timestamps = result
            .get("timestamp")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let quote = result
            .pointer("/indicators/quote/0")
            .cloned()
            .unwrap_or(Value::Null);

        let field = |name: &str, i: usize| -> Option<f64> {
            quote
                .get(name)
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.get(i))
                .and_then(|v| v.as_f64())
        };

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let Some(date) = ts.as_i64().and_then(epoch_to_date) else {
                continue;
            };
            // Days with null quotes (halts, partial sessions) are skipped.
            let (Some(open), Some(high), Some(low), Some(close)) = (
                field("open", i),
                field("high", i),
                field("low", i),
                field("close", i),
            ) else {
                continue;
            };
            let volume = quote
                .get("volume")
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.get(i))
                .and_then(|v| v.as_i64())
                .unwrap_or(0);

            points.push(PricePoint {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        debug!("Retrieved {} price bars for {}", points.len(), ticker);
        Ok(points)
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ScreenError> {
        let url = format!(
            "{}/{}?modules=summaryDetail,incomeStatementHistory,earningsHistory",
            QUOTE_SUMMARY_URL, ticker
        );
        let data = self.get_json(&url).await?;

        let result = data.pointer("/quoteSummary/result/0").ok_or_else(|| {
            ScreenError::DataUnavailable(format!("no quote summary for {}", ticker))
        })?;

        let beta = raw_f64(result.pointer("/summaryDetail/beta"));

        // Annual income statements arrive most-recent-first.
        let revenue: Vec<f64> = result
            .pointer("/incomeStatementHistory/incomeStatementHistory")
            .and_then(|v| v.as_array())
            .map(|stmts| {
                stmts
                    .iter()
                    .filter_map(|s| raw_f64(s.get("totalRevenue")))
                    .collect()
            })
            .unwrap_or_default();

        // Earnings history arrives oldest-first; flip it to match the
        // most-recent-first convention of the growth filter.
        let mut eps: Vec<f64> = result
            .pointer("/earningsHistory/history")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| raw_f64(e.get("epsActual")))
                    .collect()
            })
            .unwrap_or_default();
        eps.reverse();

        debug!(
            "Fundamentals for {}: beta={:?}, {} revenue figures, {} eps figures",
            ticker,
            beta,
            revenue.len(),
            eps.len()
        );
        Ok(Fundamentals { beta, revenue, eps })
    }

    async fn list_expiries(&self, ticker: &str) -> Result<Vec<NaiveDate>, ScreenError> {
        let url = format!("{}/{}", OPTIONS_URL, ticker);
        let data = self.get_json(&url).await?;

        let expiries = data
            .pointer("/optionChain/result/0/expirationDates")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_i64())
                    .filter_map(epoch_to_date)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        debug!("{} lists {} option expiries", ticker, expiries.len());
        Ok(expiries)
    }

    async fn fetch_option_chain(
        &self,
        ticker: &str,
        expiry: NaiveDate,
    ) -> Result<Vec<OptionContract>, ScreenError> {
        // Yahoo keys chains by the expiry's midnight-UTC epoch.
        let epoch = expiry
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| ScreenError::DataUnavailable(format!("bad expiry date {}", expiry)))?;

        let url = format!("{}/{}?date={}", OPTIONS_URL, ticker, epoch);
        let data = self.get_json(&url).await?;

        let calls = data
            .pointer("/optionChain/result/0/options/0/calls")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(parse_contract).collect::<Vec<_>>())
            .unwrap_or_default();

        debug!("{} {} chain: {} calls", ticker, expiry, calls.len());
        Ok(calls)
    }
}
