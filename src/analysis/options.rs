//! Option-chain selection: expiry window, liquidity filters, best contract,
//! and the cross-expiry IV rank.

use chrono::NaiveDate;

use crate::error::ScreenError;
use crate::models::{OptionContract, ScreenerCriteria};

/// A liquidity-filtered contract paired with its relative spread.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidContract {
    pub contract: OptionContract,
    pub spread_ratio: f64,
}

/// Pick the nearest expiry whose days-to-expiry falls inside the window.
///
/// Expiries arrive ascending from the provider, so the first in-window entry
/// is the nearest one.
pub fn select_expiry(
    expiries: &[NaiveDate],
    today: NaiveDate,
    criteria: &ScreenerCriteria,
) -> Result<NaiveDate, ScreenError> {
    expiries
        .iter()
        .copied()
        .find(|expiry| {
            let days = (*expiry - today).num_days();
            days >= criteria.min_days_to_expiry && days <= criteria.max_days_to_expiry
        })
        .ok_or(ScreenError::NoValidExpiry {
            min: criteria.min_days_to_expiry,
            max: criteria.max_days_to_expiry,
        })
}

/// Keep near-the-money, cheap, open-interest-backed calls with a tight
/// relative spread.
pub fn filter_liquid_calls(
    calls: &[OptionContract],
    spot: f64,
    criteria: &ScreenerCriteria,
) -> Result<Vec<LiquidContract>, ScreenError> {
    let liquid: Vec<&OptionContract> = calls
        .iter()
        .filter(|c| {
            c.strike <= spot * criteria.max_strike_to_spot
                && c.last_price <= criteria.max_premium
                && c.open_interest > criteria.min_open_interest
        })
        .collect();
    if liquid.is_empty() {
        return Err(ScreenError::NoLiquidContract("liquidity"));
    }

    // A zero last price yields an infinite (or NaN) ratio, which the strict
    // comparison drops.
    let tight: Vec<LiquidContract> = liquid
        .into_iter()
        .map(|c| LiquidContract {
            contract: c.clone(),
            spread_ratio: (c.ask - c.bid) / c.last_price,
        })
        .filter(|lc| lc.spread_ratio < criteria.max_spread_ratio)
        .collect();
    if tight.is_empty() {
        return Err(ScreenError::NoLiquidContract("spread"));
    }

    Ok(tight)
}

/// Highest-volume survivor; on equal volume the first-encountered contract
/// stays, which keeps selection stable for a fixed chain ordering. `None`
/// for an empty slice.
pub fn best_by_volume(contracts: &[LiquidContract]) -> Option<&LiquidContract> {
    let mut best: Option<&LiquidContract> = None;
    for candidate in contracts {
        match best {
            Some(b) if candidate.contract.volume <= b.contract.volume => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Implied volatility of the at-the-money call (minimum |strike − spot|,
/// first such strike on ties). `None` for an empty chain.
pub fn at_the_money_iv(calls: &[OptionContract], spot: f64) -> Option<f64> {
    let mut best: Option<&OptionContract> = None;
    for c in calls {
        match best {
            Some(b) if (c.strike - spot).abs() >= (b.strike - spot).abs() => {}
            _ => best = Some(c),
        }
    }
    best.map(|c| c.implied_volatility)
}

/// Relative IV percentile across sampled expiries, in percent.
///
/// "Latest" is the last successfully sampled IV in listing order. An
/// all-equal sample set has no usable range and is rejected outright rather
/// than propagated as a non-finite rank.
pub fn iv_rank(ivs: &[f64]) -> Result<f64, ScreenError> {
    if ivs.len() < 2 {
        return Err(ScreenError::DataUnavailable(format!(
            "only {} IV sample(s) retrieved, need 2",
            ivs.len()
        )));
    }

    let min = ivs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ivs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return Err(ScreenError::DegenerateIvRange);
    }

    let latest = ivs[ivs.len() - 1];
    Ok((latest - min) / (max - min) * 100.0)
}
