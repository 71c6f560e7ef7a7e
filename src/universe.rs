//! Ticker-universe bootstrap: S&P 500 constituents ranked by latest daily
//! volume.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::MarketDataProvider;

const CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/master/data/constituents.csv";

#[derive(Debug, Deserialize)]
struct ConstituentRow {
    #[serde(rename = "Symbol")]
    symbol: String,
}

/// Quote APIs want dashes where index files use dots (BRK.B -> BRK-B).
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.replace('.', "-")
}

/// Parse constituent symbols out of the index CSV.
pub fn parse_constituents(csv_text: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut symbols = Vec::new();
    for row in reader.deserialize::<ConstituentRow>() {
        let row = row?;
        symbols.push(normalize_symbol(&row.symbol));
    }
    if symbols.is_empty() {
        return Err(anyhow!("constituents CSV contained no symbols"));
    }
    Ok(symbols)
}

/// Download the current S&P 500 symbol list.
pub async fn fetch_sp500_symbols() -> Result<Vec<String>> {
    let text = reqwest::get(CONSTITUENTS_URL).await?.text().await?;
    let symbols = parse_constituents(&text)?;
    info!("📊 Loaded {} S&P 500 symbols", symbols.len());
    Ok(symbols)
}

/// Keep the `limit` highest-volume symbols, by latest daily bar.
///
/// Symbols whose volume lookup fails are skipped. Equal volumes order by
/// symbol so the universe is deterministic for fixed data.
pub async fn top_volume_symbols(
    provider: Arc<dyn MarketDataProvider>,
    symbols: &[String],
    limit: usize,
) -> Vec<String> {
    let mut volumes: Vec<(String, i64)> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match provider.fetch_price_history(symbol, 5).await {
            Ok(points) => {
                if let Some(last) = points.last() {
                    volumes.push((symbol.clone(), last.volume));
                }
            }
            Err(e) => warn!("skipping {} in volume ranking: {}", symbol, e),
        }
    }

    volumes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    volumes.truncate(limit);
    volumes.into_iter().map(|(symbol, _)| symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("BRK.B"), "BRK-B");
        assert_eq!(normalize_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn test_parse_constituents() {
        let csv_text = "Symbol,Name,Sector\nAAPL,Apple Inc.,Technology\nBRK.B,Berkshire,Financials\n";
        let symbols = parse_constituents(csv_text).unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string(), "BRK-B".to_string()]);
    }

    #[test]
    fn test_parse_constituents_empty_is_error() {
        assert!(parse_constituents("Symbol,Name,Sector\n").is_err());
    }
}
