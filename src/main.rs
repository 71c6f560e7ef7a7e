use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Arg, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use call_screener::analysis::{accepted_candidates, OptionScreener};
use call_screener::api::{MarketDataProvider, YahooFinanceClient};
use call_screener::export::write_csv_file;
use call_screener::models::ScreenerCriteria;
use call_screener::universe::{fetch_sp500_symbols, top_volume_symbols};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let matches = Command::new("Call Option Screener")
        .version("0.1")
        .about("Screens high-volume equities for liquid short-dated call options")
        .subcommand(
            Command::new("screen")
                .about("Run the full screening pipeline and write a result CSV")
                .arg(Arg::new("limit")
                    .long("limit")
                    .value_name("N")
                    .help("Universe size, by descending daily volume")
                    .default_value("100"))
                .arg(Arg::new("workers")
                    .long("workers")
                    .value_name("N")
                    .help("Concurrent evaluation workers (1 = sequential)")
                    .default_value("1"))
                .arg(Arg::new("output")
                    .long("output")
                    .value_name("FILE")
                    .help("Result CSV path")
                    .default_value("call_option_screening_result.csv"))
                .arg(Arg::new("tickers")
                    .long("tickers")
                    .value_name("LIST")
                    .help("Comma-separated tickers, bypassing the S&P 500 bootstrap"))
                .arg(Arg::new("risk-free-rate")
                    .long("risk-free-rate")
                    .value_name("RATE")
                    .help("Annualized risk-free rate for the Greeks")
                    .default_value("0.02"))
                .arg(Arg::new("rate-limit")
                    .long("rate-limit")
                    .value_name("RPM")
                    .help("Provider requests per minute")
                    .default_value("120")),
        )
        .subcommand(
            Command::new("universe")
                .about("Print the top-volume S&P 500 universe")
                .arg(Arg::new("limit")
                    .long("limit")
                    .value_name("N")
                    .default_value("100"))
                .arg(Arg::new("rate-limit")
                    .long("rate-limit")
                    .value_name("RPM")
                    .default_value("120")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("screen", sub)) => {
            let limit: usize = sub.get_one::<String>("limit").unwrap().parse()?;
            let workers: usize = sub.get_one::<String>("workers").unwrap().parse()?;
            let output = PathBuf::from(sub.get_one::<String>("output").unwrap());
            let risk_free_rate: f64 =
                sub.get_one::<String>("risk-free-rate").unwrap().parse()?;
            let rate_limit: u32 = sub.get_one::<String>("rate-limit").unwrap().parse()?;

            let provider: Arc<dyn MarketDataProvider> =
                Arc::new(YahooFinanceClient::new(rate_limit)?);

            let tickers = match sub.get_one::<String>("tickers") {
                Some(list) => list
                    .split(',')
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
                None => {
                    let symbols = fetch_sp500_symbols().await?;
                    top_volume_symbols(Arc::clone(&provider), &symbols, limit).await
                }
            };
            info!("📋 Universe: {} tickers", tickers.len());

            let criteria = ScreenerCriteria {
                risk_free_rate,
                ..ScreenerCriteria::default()
            };
            let screener = Arc::new(OptionScreener::new(provider, criteria));
            let outcomes = if workers > 1 {
                screener.run_screening_concurrent(&tickers, workers).await
            } else {
                screener.run_screening(&tickers).await
            };

            let candidates = accepted_candidates(outcomes);
            if candidates.is_empty() {
                println!("❌ No contracts passed every gate today");
            } else {
                write_csv_file(&candidates, &output)?;
                println!(
                    "✅ {} qualifying call contract(s) written to {}",
                    candidates.len(),
                    output.display()
                );
            }
        }

        Some(("universe", sub)) => {
            let limit: usize = sub.get_one::<String>("limit").unwrap().parse()?;
            let rate_limit: u32 = sub.get_one::<String>("rate-limit").unwrap().parse()?;

            let provider: Arc<dyn MarketDataProvider> =
                Arc::new(YahooFinanceClient::new(rate_limit)?);
            let symbols = fetch_sp500_symbols().await?;
            let top = top_volume_symbols(provider, &symbols, limit).await;
            for symbol in top {
                println!("{}", symbol);
            }
        }

        _ => {
            println!("No command specified. Try: call-screener screen --limit 100");
        }
    }

    Ok(())
}
