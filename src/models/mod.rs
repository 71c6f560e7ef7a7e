// Data model for the call-option screening pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily bar of a ticker's price history, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Ticker-level fundamentals as reported by the provider.
///
/// `revenue` and `eps` are most-recent-first; growth rates are derived from
/// the first two entries, never stored.
#[derive(Debug, Clone, Default)]
pub struct Fundamentals {
    pub beta: Option<f64>,
    pub revenue: Vec<f64>,
    pub eps: Vec<f64>,
}

/// A single call contract from an option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub last_price: f64,
    pub open_interest: i64,
    pub volume: i64,
    pub implied_volatility: f64,
}

/// Call side of one (ticker, expiry) chain.
#[derive(Debug, Clone)]
pub struct OptionChain {
    pub expiry: NaiveDate,
    pub calls: Vec<OptionContract>,
}

/// Latest and previous indicator rows examined by the signal evaluator.
///
/// `None` means the indicator had not warmed up at that row; comparisons
/// against `None` never fire a signal.
#[derive(Debug, Clone)]
pub struct TechnicalState {
    pub latest_close: f64,
    pub latest_rsi: Option<f64>,
    pub previous_rsi: Option<f64>,
    pub latest_upper_band: Option<f64>,
    pub latest_macd: Option<f64>,
    pub previous_macd: Option<f64>,
    pub latest_macd_signal: Option<f64>,
    pub previous_macd_signal: Option<f64>,
}

/// The three momentum signals derived from `TechnicalState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnicalSignals {
    pub bollinger_breakout: bool,
    pub rsi_rebound: bool,
    pub macd_cross: bool,
}

impl TechnicalSignals {
    pub fn any(&self) -> bool {
        self.bollinger_breakout || self.rsi_rebound || self.macd_cross
    }
}

/// Output record for a ticker that survived every gate.
///
/// Numeric fields are rounded at construction so re-running on frozen input
/// yields byte-identical rows. Serde renames match the export column set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningCandidate {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Beta")]
    pub beta: f64,
    #[serde(rename = "IV Rank")]
    pub iv_rank: f64,
    #[serde(rename = "EPS YoY %")]
    pub eps_growth_pct: f64,
    #[serde(rename = "Revenue YoY %")]
    pub revenue_growth_pct: f64,
    #[serde(rename = "Strike")]
    pub strike: f64,
    #[serde(rename = "Expiry")]
    pub expiry: NaiveDate,
    #[serde(rename = "Premium")]
    pub premium: f64,
    #[serde(rename = "Delta")]
    pub delta: f64,
    #[serde(rename = "Theta")]
    pub theta: f64,
    #[serde(rename = "OI")]
    pub open_interest: i64,
    #[serde(rename = "Bid")]
    pub bid: f64,
    #[serde(rename = "Ask")]
    pub ask: f64,
    #[serde(rename = "Spread %")]
    pub spread_pct: f64,
    #[serde(rename = "MACD Cross")]
    pub macd_cross: bool,
    #[serde(rename = "RSI Rebound")]
    pub rsi_rebound: bool,
    #[serde(rename = "Bollinger Breakout")]
    pub bollinger_breakout: bool,
}

/// Round to `n` decimal places for stable candidate fields.
pub fn round_dp(value: f64, n: u32) -> f64 {
    let factor = 10f64.powi(n as i32);
    (value * factor).round() / factor
}

/// All screening thresholds with the production defaults.
#[derive(Debug, Clone)]
pub struct ScreenerCriteria {
    /// Minimum price points before technical evaluation.
    pub min_history_points: usize,
    /// Lookback window requested from the provider, in calendar days.
    pub lookback_days: u32,
    /// Beta must be strictly above this.
    pub min_beta: f64,
    /// Accepted days-to-expiry window, inclusive.
    pub min_days_to_expiry: i64,
    pub max_days_to_expiry: i64,
    /// Strike cap as a multiple of spot.
    pub max_strike_to_spot: f64,
    /// Absolute premium cap per contract.
    pub max_premium: f64,
    /// Open interest must be strictly above this.
    pub min_open_interest: i64,
    /// (ask - bid) / last_price must be strictly below this.
    pub max_spread_ratio: f64,
    /// Number of leading expiries sampled for the IV rank.
    pub iv_sample_expiries: usize,
    /// Minimum acceptable IV rank, in percent.
    pub min_iv_rank: f64,
    /// Delta acceptance band, inclusive.
    pub min_delta: f64,
    pub max_delta: f64,
    /// |theta| may not exceed this fraction of the premium.
    pub max_theta_to_premium: f64,
    /// Annualized risk-free rate fed to Black-Scholes.
    pub risk_free_rate: f64,
}

impl Default for ScreenerCriteria {
    fn default() -> Self {
        Self {
            min_history_points: 30,
            lookback_days: 182, // ~6 months of calendar days
            min_beta: 1.0,
            min_days_to_expiry: 7,
            max_days_to_expiry: 21,
            max_strike_to_spot: 1.02,
            max_premium: 2.50,
            min_open_interest: 500,
            max_spread_ratio: 0.10,
            iv_sample_expiries: 6,
            min_iv_rank: 40.0,
            min_delta: 0.40,
            max_delta: 0.70,
            max_theta_to_premium: 0.10,
            risk_free_rate: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.23456, 2), 1.23);
        assert_eq!(round_dp(2.346, 2), 2.35);
        assert_eq!(round_dp(-0.035235, 4), -0.0352);
    }

    #[test]
    fn test_default_criteria_match_production_thresholds() {
        let c = ScreenerCriteria::default();
        assert_eq!(c.min_history_points, 30);
        assert_eq!(c.min_days_to_expiry, 7);
        assert_eq!(c.max_days_to_expiry, 21);
        assert_eq!(c.max_premium, 2.50);
        assert_eq!(c.min_open_interest, 500);
        assert_eq!(c.min_iv_rank, 40.0);
    }
}
