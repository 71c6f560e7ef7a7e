//! Screening orchestrator: runs each ticker through the fixed filter chain
//! and aggregates survivors in ticker-input order.
//!
//! Chain per ticker: price history → technical OR-signal → beta → growth →
//! expiry window → liquidity/spread → IV rank → best contract → Greeks →
//! delta band → theta bound. The first failing stage rejects the ticker;
//! every rejection is absorbed at the ticker boundary so one bad symbol can
//! never abort the batch.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::analysis::fundamentals::{check_beta, growth_rates};
use crate::analysis::greeks::black_scholes_greeks;
use crate::analysis::options::{
    at_the_money_iv, best_by_volume, filter_liquid_calls, iv_rank, select_expiry, LiquidContract,
};
use crate::analysis::technical::evaluate_technical;
use crate::api::MarketDataProvider;
use crate::error::{ScreenError, Stage};
use crate::models::{round_dp, ScreenerCriteria, ScreeningCandidate, TechnicalSignals};

/// Outcome of one ticker's journey through the chain.
#[derive(Debug)]
pub enum TickerOutcome {
    Accepted(ScreeningCandidate),
    Rejected {
        ticker: String,
        stage: Stage,
        reason: ScreenError,
    },
}

impl TickerOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TickerOutcome::Accepted(_))
    }

    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Accepted(c) => &c.ticker,
            TickerOutcome::Rejected { ticker, .. } => ticker,
        }
    }
}

pub struct OptionScreener {
    provider: Arc<dyn MarketDataProvider>,
    criteria: ScreenerCriteria,
    evaluation_date: NaiveDate,
}

impl OptionScreener {
    pub fn new(provider: Arc<dyn MarketDataProvider>, criteria: ScreenerCriteria) -> Self {
        Self {
            provider,
            criteria,
            evaluation_date: Local::now().date_naive(),
        }
    }

    /// Pin the evaluation date, for reproducible runs over frozen data.
    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = date;
        self
    }

    /// Run the full chain for every ticker, sequentially, in input order.
    pub async fn run_screening(&self, tickers: &[String]) -> Vec<TickerOutcome> {
        info!("🔍 Screening {} tickers", tickers.len());
        let mut outcomes = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            outcomes.push(self.evaluate_ticker(ticker).await);
        }
        let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
        info!("🎯 {} of {} tickers passed every gate", accepted, tickers.len());
        outcomes
    }

    /// Fan the universe out over `workers` tasks pulling from a shared queue,
    /// then restore ticker-input order.
    pub async fn run_screening_concurrent(
        self: Arc<Self>,
        tickers: &[String],
        workers: usize,
    ) -> Vec<TickerOutcome> {
        let workers = workers.max(1).min(tickers.len().max(1));
        info!("🚀 Screening {} tickers across {} workers", tickers.len(), workers);

        let queue: Arc<Mutex<VecDeque<(usize, String)>>> = Arc::new(Mutex::new(
            tickers.iter().cloned().enumerate().collect(),
        ));
        let results: Arc<Mutex<Vec<(usize, TickerOutcome)>>> =
            Arc::new(Mutex::new(Vec::with_capacity(tickers.len())));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let screener = Arc::clone(&self);

            handles.push(tokio::spawn(async move {
                loop {
                    let next = queue.lock().unwrap().pop_front();
                    let Some((index, ticker)) = next else { break };
                    let outcome = screener.evaluate_ticker(&ticker).await;
                    results.lock().unwrap().push((index, outcome));
                }
            }));
        }
        for handle in handles {
            // Worker bodies catch everything per ticker; a join error here
            // would mean a panic in pure logic and is worth surfacing.
            if let Err(e) = handle.await {
                warn!("worker task failed: {}", e);
            }
        }

        let mut indexed = Arc::try_unwrap(results)
            .map(|m| m.into_inner().unwrap())
            .unwrap_or_default();
        indexed.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<TickerOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

        let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
        info!("🎯 {} of {} tickers passed every gate", accepted, tickers.len());
        outcomes
    }

    /// Evaluate a single ticker, converting any stage failure into a tagged
    /// rejection.
    pub async fn evaluate_ticker(&self, ticker: &str) -> TickerOutcome {
        match self.run_chain(ticker).await {
            Ok(candidate) => {
                info!("✅ {} qualified at strike {}", ticker, candidate.strike);
                TickerOutcome::Accepted(candidate)
            }
            Err((stage, reason)) => {
                debug!("⏭️  {} rejected at {}: {}", ticker, stage, reason);
                TickerOutcome::Rejected {
                    ticker: ticker.to_string(),
                    stage,
                    reason,
                }
            }
        }
    }

    async fn run_chain(&self, ticker: &str) -> Result<ScreeningCandidate, (Stage, ScreenError)> {
        let c = &self.criteria;

        // Technical OR-signal
        let prices = self
            .provider
            .fetch_price_history(ticker, c.lookback_days)
            .await
            .map_err(|e| (Stage::Fetch, e))?;
        let (state, signals) = evaluate_technical(&prices, c.min_history_points)
            .map_err(|e| (Stage::Technical, e))?;
        if !signals.any() {
            return Err((Stage::Technical, ScreenError::NoTechnicalSignal));
        }
        let spot = state.latest_close;

        // Beta and growth gates
        let fundamentals = self
            .provider
            .fetch_fundamentals(ticker)
            .await
            .map_err(|e| (Stage::Fundamentals, e))?;
        let beta =
            check_beta(fundamentals.beta, c.min_beta).map_err(|e| (Stage::Fundamentals, e))?;
        let growth = growth_rates(&fundamentals).map_err(|e| (Stage::Fundamentals, e))?;
        if !growth.any_positive() {
            return Err((Stage::Fundamentals, ScreenError::NoGrowth));
        }

        // Expiry window, liquidity, spread
        let expiries = self
            .provider
            .list_expiries(ticker)
            .await
            .map_err(|e| (Stage::OptionChain, e))?;
        let expiry =
            select_expiry(&expiries, self.evaluation_date, c).map_err(|e| (Stage::OptionChain, e))?;
        let chain = self
            .provider
            .fetch_option_chain(ticker, expiry)
            .await
            .map_err(|e| (Stage::OptionChain, e))?;
        let survivors = filter_liquid_calls(&chain, spot, c).map_err(|e| (Stage::OptionChain, e))?;

        // IV rank across the leading expiries; per-expiry failures only drop
        // that sample.
        let mut ivs = Vec::new();
        for sample_expiry in expiries.iter().take(c.iv_sample_expiries) {
            let calls = if *sample_expiry == expiry {
                chain.clone()
            } else {
                match self.provider.fetch_option_chain(ticker, *sample_expiry).await {
                    Ok(calls) => calls,
                    Err(e) => {
                        debug!("{}: skipping IV sample {}: {}", ticker, sample_expiry, e);
                        continue;
                    }
                }
            };
            if let Some(iv) = at_the_money_iv(&calls, spot) {
                ivs.push(iv);
            }
        }
        let rank = iv_rank(&ivs).map_err(|e| (Stage::IvRank, e))?;
        if rank < c.min_iv_rank {
            return Err((
                Stage::IvRank,
                ScreenError::IvRankBelowFloor {
                    rank,
                    floor: c.min_iv_rank,
                },
            ));
        }

        // Greeks on the highest-volume survivor; `survivors` is non-empty
        // here, so the fallback arm is unreachable.
        let best = best_by_volume(&survivors)
            .ok_or((Stage::OptionChain, ScreenError::NoLiquidContract("liquidity")))?;
        let days_to_expiry = (expiry - self.evaluation_date).num_days();
        let time_to_expiry = days_to_expiry as f64 / 365.0;
        let greeks = black_scholes_greeks(
            spot,
            best.contract.strike,
            time_to_expiry,
            c.risk_free_rate,
            best.contract.implied_volatility,
        )
        .map_err(|e| (Stage::Greeks, e))?;

        if greeks.delta < c.min_delta || greeks.delta > c.max_delta {
            return Err((Stage::Greeks, ScreenError::DeltaOutOfBand(greeks.delta)));
        }
        let premium = best.contract.last_price;
        if greeks.theta.abs() > c.max_theta_to_premium * premium {
            return Err((
                Stage::Greeks,
                ScreenError::ThetaTooLarge {
                    theta: greeks.theta,
                    premium,
                    cap: c.max_theta_to_premium * 100.0,
                },
            ));
        }

        Ok(build_candidate(
            ticker, spot, beta, rank, growth.eps_growth, growth.revenue_growth, expiry, best,
            greeks.delta, greeks.theta, &signals,
        ))
    }
}

/// Assemble the immutable output record, rounding the derived fields so
/// identical input data always produces identical rows.
#[allow(clippy::too_many_arguments)]
fn build_candidate(
    ticker: &str,
    spot: f64,
    beta: f64,
    iv_rank: f64,
    eps_growth: f64,
    revenue_growth: f64,
    expiry: NaiveDate,
    best: &LiquidContract,
    delta: f64,
    theta: f64,
    signals: &TechnicalSignals,
) -> ScreeningCandidate {
    ScreeningCandidate {
        ticker: ticker.to_string(),
        price: round_dp(spot, 2),
        beta: round_dp(beta, 2),
        iv_rank: round_dp(iv_rank, 2),
        eps_growth_pct: round_dp(eps_growth * 100.0, 2),
        revenue_growth_pct: round_dp(revenue_growth * 100.0, 2),
        strike: best.contract.strike,
        expiry,
        premium: best.contract.last_price,
        delta: round_dp(delta, 2),
        theta: round_dp(theta, 4),
        open_interest: best.contract.open_interest,
        bid: best.contract.bid,
        ask: best.contract.ask,
        spread_pct: round_dp(best.spread_ratio * 100.0, 2),
        macd_cross: signals.macd_cross,
        rsi_rebound: signals.rsi_rebound,
        bollinger_breakout: signals.bollinger_breakout,
    }
}

/// Reduce outcomes to the accepted candidates, preserving order.
pub fn accepted_candidates(outcomes: Vec<TickerOutcome>) -> Vec<ScreeningCandidate> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            TickerOutcome::Accepted(candidate) => Some(candidate),
            TickerOutcome::Rejected { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionContract;

    fn liquid(volume: i64) -> LiquidContract {
        LiquidContract {
            contract: OptionContract {
                strike: 101.0,
                bid: 1.10,
                ask: 1.18,
                last_price: 1.15,
                open_interest: 800,
                volume,
                implied_volatility: 0.41,
            },
            spread_ratio: 0.0695652,
        }
    }

    #[test]
    fn test_build_candidate_rounds_derived_fields() {
        let signals = TechnicalSignals {
            bollinger_breakout: true,
            rsi_rebound: false,
            macd_cross: false,
        };
        let best = liquid(950);
        let candidate = build_candidate(
            "AAPL",
            100.456,
            1.234,
            61.987,
            0.12345,
            -0.045678,
            NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
            &best,
            0.54321,
            -0.035235,
            &signals,
        );

        assert_eq!(candidate.price, 100.46);
        assert_eq!(candidate.beta, 1.23);
        assert_eq!(candidate.iv_rank, 61.99);
        assert_eq!(candidate.eps_growth_pct, 12.35);
        assert_eq!(candidate.revenue_growth_pct, -4.57);
        assert_eq!(candidate.delta, 0.54);
        assert_eq!(candidate.theta, -0.0352);
        assert_eq!(candidate.spread_pct, 6.96);
        // Quoted fields stay verbatim.
        assert_eq!(candidate.strike, 101.0);
        assert_eq!(candidate.premium, 1.15);
        assert_eq!(candidate.bid, 1.10);
        assert_eq!(candidate.ask, 1.18);
        assert!(candidate.bollinger_breakout);
        assert!(!candidate.macd_cross);
    }

    #[test]
    fn test_accepted_candidates_drops_rejections() {
        let signals = TechnicalSignals {
            bollinger_breakout: true,
            rsi_rebound: false,
            macd_cross: false,
        };
        let candidate = build_candidate(
            "NVDA",
            100.0,
            1.5,
            55.0,
            0.1,
            0.1,
            NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
            &liquid(100),
            0.55,
            -0.03,
            &signals,
        );
        let outcomes = vec![
            TickerOutcome::Rejected {
                ticker: "IBM".to_string(),
                stage: Stage::Technical,
                reason: ScreenError::NoTechnicalSignal,
            },
            TickerOutcome::Accepted(candidate.clone()),
        ];
        let accepted = accepted_candidates(outcomes);
        assert_eq!(accepted, vec![candidate]);
    }
}
