//! Closed-form Black-Scholes call Greeks.
//!
//! d1 = (ln(S/K) + (r + σ²/2)T) / (σ√T)
//! d2 = d1 − σ√T
//! delta = Φ(d1)
//! theta = (−S·φ(d1)·σ/(2√T) − r·K·e^(−rT)·Φ(d2)) / 365   (per calendar day)

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::error::ScreenError;

/// Delta and per-calendar-day theta for a European call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionGreeks {
    pub delta: f64,
    pub theta: f64,
}

/// Compute call delta and theta from Black-Scholes inputs.
///
/// `time_to_expiry` is in years, `volatility` is annualized. Pure function;
/// rejects inputs that would make the log or the division undefined.
pub fn black_scholes_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
) -> Result<OptionGreeks, ScreenError> {
    if time_to_expiry <= 0.0 {
        return Err(ScreenError::Domain("time to expiry must be positive"));
    }
    if volatility <= 0.0 {
        return Err(ScreenError::Domain("volatility must be positive"));
    }
    if spot <= 0.0 || strike <= 0.0 {
        return Err(ScreenError::Domain("spot and strike must be positive"));
    }

    let normal = Normal::new(0.0, 1.0).unwrap();

    let sqrt_t = time_to_expiry.sqrt();
    let d1 = ((spot / strike).ln() + (risk_free_rate + 0.5 * volatility * volatility) * time_to_expiry)
        / (volatility * sqrt_t);
    let d2 = d1 - volatility * sqrt_t;

    let delta = normal.cdf(d1);
    let theta = (-(spot * normal.pdf(d1) * volatility) / (2.0 * sqrt_t)
        - risk_free_rate * strike * (-risk_free_rate * time_to_expiry).exp() * normal.cdf(d2))
        / 365.0;

    Ok(OptionGreeks { delta, theta })
}
