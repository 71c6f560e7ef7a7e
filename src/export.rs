//! CSV export of the screening result set.
//!
//! The column set and header names are the output contract; anything past
//! writing the ordered records (spreadsheet upload, delivery) is out of
//! scope.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::models::ScreeningCandidate;

/// Serialize candidates to CSV, headers first, preserving record order.
pub fn write_csv<W: std::io::Write>(candidates: &[ScreeningCandidate], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for candidate in candidates {
        csv_writer.serialize(candidate)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the result set to a file path.
pub fn write_csv_file(candidates: &[ScreeningCandidate], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(candidates, file)?;
    info!("💾 Wrote {} candidates to {}", candidates.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn candidate() -> ScreeningCandidate {
        ScreeningCandidate {
            ticker: "AAPL".to_string(),
            price: 100.46,
            beta: 1.23,
            iv_rank: 61.99,
            eps_growth_pct: 12.35,
            revenue_growth_pct: -4.57,
            strike: 101.0,
            expiry: NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
            premium: 1.15,
            delta: 0.54,
            theta: -0.0352,
            open_interest: 800,
            bid: 1.1,
            ask: 1.18,
            spread_pct: 6.96,
            macd_cross: false,
            rsi_rebound: true,
            bollinger_breakout: false,
        }
    }

    #[test]
    fn test_csv_header_and_row() {
        let mut buf = Vec::new();
        write_csv(&[candidate()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Ticker,Price,Beta,IV Rank,EPS YoY %,Revenue YoY %,Strike,Expiry,Premium,\
             Delta,Theta,OI,Bid,Ask,Spread %,MACD Cross,RSI Rebound,Bollinger Breakout"
        );
        assert_eq!(
            lines.next().unwrap(),
            "AAPL,100.46,1.23,61.99,12.35,-4.57,101.0,2025-06-13,1.15,0.54,-0.0352,800,1.1,1.18,6.96,false,true,false"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_identical_input_identical_bytes() {
        let rows = vec![candidate(), candidate()];
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_csv(&rows, &mut first).unwrap();
        write_csv(&rows, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
