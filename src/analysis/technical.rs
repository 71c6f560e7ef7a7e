//! Momentum and volatility signals from a daily price history.
//!
//! Indicator rows before an indicator's warm-up are `None`; a comparison
//! that touches `None` never fires a signal. RSI uses Wilder smoothing,
//! Bollinger uses SMA(20) + 2 population standard deviations, MACD is the
//! usual 12/26 EMA difference with a 9-period EMA signal line.

use crate::error::ScreenError;
use crate::models::{PricePoint, TechnicalState, TechnicalSignals};

const RSI_PERIOD: usize = 14;
const BB_PERIOD: usize = 20;
const BB_STD: f64 = 2.0;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

const RSI_OVERSOLD: f64 = 30.0;

/// Evaluate the three boolean signals over a full price history.
///
/// Requires at least `min_points` bars; the last two computed rows are the
/// only ones examined.
pub fn evaluate_technical(
    prices: &[PricePoint],
    min_points: usize,
) -> Result<(TechnicalState, TechnicalSignals), ScreenError> {
    if prices.len() < min_points {
        return Err(ScreenError::InsufficientHistory {
            got: prices.len(),
            need: min_points,
        });
    }

    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let state = compute_state(&closes);
    let signals = derive_signals(&state);
    Ok((state, signals))
}

/// Last-two-row snapshot of RSI, Bollinger upper band, and MACD.
pub fn compute_state(closes: &[f64]) -> TechnicalState {
    let n = closes.len();
    let rsi = rsi_series(closes, RSI_PERIOD);
    let upper = bollinger_upper(closes, BB_PERIOD, BB_STD);
    let (macd, signal) = macd_series(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    TechnicalState {
        latest_close: closes[n - 1],
        latest_rsi: rsi[n - 1],
        previous_rsi: rsi[n - 2],
        latest_upper_band: upper[n - 1],
        latest_macd: macd[n - 1],
        previous_macd: macd[n - 2],
        latest_macd_signal: signal[n - 1],
        previous_macd_signal: signal[n - 2],
    }
}

/// Apply the three signal rules to a computed state.
pub fn derive_signals(state: &TechnicalState) -> TechnicalSignals {
    let bollinger_breakout = state
        .latest_upper_band
        .map(|upper| state.latest_close > upper)
        .unwrap_or(false);

    let rsi_rebound = match (state.previous_rsi, state.latest_rsi) {
        (Some(prev), Some(latest)) => prev < RSI_OVERSOLD && latest > RSI_OVERSOLD,
        _ => false,
    };

    let macd_cross = match (
        state.previous_macd,
        state.previous_macd_signal,
        state.latest_macd,
        state.latest_macd_signal,
    ) {
        (Some(pm), Some(ps), Some(lm), Some(ls)) => pm < ps && lm > ls,
        _ => false,
    };

    TechnicalSignals {
        bollinger_breakout,
        rsi_rebound,
        macd_cross,
    }
}

/// RSI with Wilder smoothing; defined from index `period` onward.
fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if n <= period {
        return out;
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let mut avg_gain: f64 = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[1..=period].iter().sum::<f64>() / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..n {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Upper Bollinger band: SMA(period) + k standard deviations over the window.
fn bollinger_upper(closes: &[f64], period: usize, k: f64) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    for i in period - 1..n {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
        out[i] = Some(mean + k * var.sqrt());
    }
    out
}

/// MACD line and signal line. The MACD line is defined once the slow EMA is;
/// the signal line once `signal` MACD values exist.
fn macd_series(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal_line = ema_over_defined(&macd, signal);
    (macd, signal_line)
}

/// EMA seeded with the SMA of the first `period` values.
fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if n < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for i in period..n {
        current = alpha * values[i] + (1.0 - alpha) * current;
        out[i] = Some(current);
    }
    out
}

/// EMA over a series with a leading undefined region, seeded with the SMA of
/// the first `period` defined values.
fn ema_over_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    let Some(start) = values.iter().position(|v| v.is_some()) else {
        return out;
    };
    if n - start < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period - 1;
    let mut current = values[start..=seed_end]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum::<f64>()
        / period as f64;
    out[seed_end] = Some(current);
    for i in seed_end + 1..n {
        if let Some(v) = values[i] {
            current = alpha * v + (1.0 - alpha) * current;
            out[i] = Some(current);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            })
            .collect()
    }

    #[test]
    fn test_short_history_is_rejected() {
        let prices = bars(&vec![100.0; 25]);
        assert_matches!(
            evaluate_technical(&prices, 30),
            Err(ScreenError::InsufficientHistory { got: 25, need: 30 })
        );
    }

    #[test]
    fn test_rsi_rebound_after_long_decline() {
        // 34 days falling a point a day, then one sharp recovery bar.
        let mut closes: Vec<f64> = (0..34).map(|i| 134.0 - i as f64).collect();
        closes.push(*closes.last().unwrap() + 20.0);

        let (state, signals) = evaluate_technical(&bars(&closes), 30).unwrap();
        assert!(state.previous_rsi.unwrap() < 30.0);
        assert!(state.latest_rsi.unwrap() > 30.0);
        assert!(signals.rsi_rebound);
        assert!(signals.any());
    }

    #[test]
    fn test_bollinger_breakout_on_spike() {
        let mut closes = vec![100.0; 34];
        closes.push(120.0);

        let (state, signals) = evaluate_technical(&bars(&closes), 30).unwrap();
        assert!(state.latest_close > state.latest_upper_band.unwrap());
        assert!(signals.bollinger_breakout);
    }

    #[test]
    fn test_flat_series_fires_nothing() {
        let closes = vec![100.0; 40];
        let (_, signals) = evaluate_technical(&bars(&closes), 30).unwrap();
        assert!(!signals.any());
    }

    #[test]
    fn test_macd_turns_bullish_after_reversal() {
        // Decline long enough for the signal line to warm up, then a strong
        // rally: the MACD line must sit above its signal at the end and a
        // bullish cross must occur somewhere in the rally.
        let mut closes: Vec<f64> = (0..45).map(|i| 120.0 - 0.5 * i as f64).collect();
        for i in 0..15 {
            closes.push(97.5 + 3.0 * (i + 1) as f64);
        }

        let (macd, signal) = macd_series(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let n = closes.len();
        assert!(macd[n - 1].unwrap() > signal[n - 1].unwrap());

        let crossed = (1..n).any(|i| {
            matches!(
                (macd[i - 1], signal[i - 1], macd[i], signal[i]),
                (Some(pm), Some(ps), Some(lm), Some(ls)) if pm < ps && lm > ls
            )
        });
        assert!(crossed);
    }

    #[test]
    fn test_macd_signal_not_warmed_up_at_minimum_history() {
        // With exactly 30 bars the 9-period signal over a 26-seeded MACD line
        // is still undefined; the cross must simply not fire.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let (state, signals) = evaluate_technical(&bars(&closes), 30).unwrap();
        assert!(state.latest_macd_signal.is_none());
        assert!(!signals.macd_cross);
    }

    #[test]
    fn test_macd_cross_requires_strict_cross() {
        let base = TechnicalState {
            latest_close: 100.0,
            latest_rsi: Some(50.0),
            previous_rsi: Some(50.0),
            latest_upper_band: Some(110.0),
            latest_macd: Some(1.0),
            previous_macd: Some(-1.0),
            latest_macd_signal: Some(0.5),
            previous_macd_signal: Some(0.0),
        };
        assert!(derive_signals(&base).macd_cross);

        // Already above before: not a cross.
        let above = TechnicalState {
            previous_macd: Some(0.5),
            previous_macd_signal: Some(0.0),
            ..base.clone()
        };
        assert!(!derive_signals(&above).macd_cross);
    }

    #[test]
    fn test_rsi_pinned_at_extremes() {
        assert_eq!(rsi_value(0.0, 1.0), 0.0);
        assert_eq!(rsi_value(1.0, 0.0), 100.0);
    }
}
