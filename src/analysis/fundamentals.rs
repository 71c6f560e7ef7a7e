//! Fundamental growth and beta gates.
//!
//! Revenue and EPS series are most-recent-first; growth compares the two
//! most recent figures. The EPS denominator is taken as an absolute value so
//! a recovery from negative earnings still reads as positive growth.

use crate::error::ScreenError;
use crate::models::Fundamentals;

/// Year-over-year growth rates derived from a fundamentals snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRates {
    pub revenue_growth: f64,
    pub eps_growth: f64,
}

impl GrowthRates {
    pub fn any_positive(&self) -> bool {
        self.revenue_growth > 0.0 || self.eps_growth > 0.0
    }
}

/// Derive growth rates, failing when either series is too short.
pub fn growth_rates(fundamentals: &Fundamentals) -> Result<GrowthRates, ScreenError> {
    if fundamentals.revenue.len() < 2 {
        return Err(ScreenError::InsufficientFundamentals("revenue series"));
    }
    if fundamentals.eps.len() < 2 {
        return Err(ScreenError::InsufficientFundamentals("eps series"));
    }

    let revenue_growth =
        (fundamentals.revenue[0] - fundamentals.revenue[1]) / fundamentals.revenue[1];
    let eps_growth = (fundamentals.eps[0] - fundamentals.eps[1]) / fundamentals.eps[1].abs();

    Ok(GrowthRates {
        revenue_growth,
        eps_growth,
    })
}

/// Beta gate: present and strictly above `min_beta`.
pub fn check_beta(beta: Option<f64>, min_beta: f64) -> Result<f64, ScreenError> {
    match beta {
        Some(b) if b > min_beta => Ok(b),
        other => Err(ScreenError::BetaTooLow(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn fundamentals(revenue: &[f64], eps: &[f64]) -> Fundamentals {
        Fundamentals {
            beta: Some(1.2),
            revenue: revenue.to_vec(),
            eps: eps.to_vec(),
        }
    }

    #[test]
    fn test_growth_rates_most_recent_first() {
        let rates = growth_rates(&fundamentals(&[110.0, 100.0], &[2.2, 2.0])).unwrap();
        assert!((rates.revenue_growth - 0.10).abs() < 1e-12);
        assert!((rates.eps_growth - 0.10).abs() < 1e-12);
        assert!(rates.any_positive());
    }

    #[test]
    fn test_eps_recovery_from_loss_is_positive_growth() {
        // -1.0 -> 0.5: denominator is |eps[1]|.
        let rates = growth_rates(&fundamentals(&[90.0, 100.0], &[0.5, -1.0])).unwrap();
        assert!((rates.eps_growth - 1.5).abs() < 1e-12);
        assert!(rates.revenue_growth < 0.0);
        assert!(rates.any_positive());
    }

    #[test]
    fn test_both_shrinking_fails_gate() {
        let rates = growth_rates(&fundamentals(&[90.0, 100.0], &[1.8, 2.0])).unwrap();
        assert!(!rates.any_positive());
    }

    #[test]
    fn test_short_series_rejected() {
        assert_matches!(
            growth_rates(&fundamentals(&[100.0], &[2.0, 1.0])),
            Err(ScreenError::InsufficientFundamentals("revenue series"))
        );
        assert_matches!(
            growth_rates(&fundamentals(&[100.0, 90.0], &[2.0])),
            Err(ScreenError::InsufficientFundamentals("eps series"))
        );
    }

    #[test]
    fn test_beta_gate() {
        assert_eq!(check_beta(Some(1.5), 1.0).unwrap(), 1.5);
        assert_matches!(check_beta(Some(1.0), 1.0), Err(ScreenError::BetaTooLow(_)));
        assert_matches!(check_beta(Some(0.8), 1.0), Err(ScreenError::BetaTooLow(_)));
        assert_matches!(check_beta(None, 1.0), Err(ScreenError::BetaTooLow(None)));
    }
}
