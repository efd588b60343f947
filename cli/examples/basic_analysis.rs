//! Basic Analysis Example
//!
//! Downloads a few large US stocks, prints their return statistics and
//! stationarity, and writes the return histograms next to the binary.

use tickerscope::prelude::*;
use tickerscope::utils::{format_stationarity_table, format_stats_table};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tickerscope::init_logger()?;

    println!("Basic Analysis Example - US large caps");
    println!("{}", "=".repeat(60));

    let tickers = vec![
        "AAPL".to_string(),
        "MSFT".to_string(),
        "NVDA".to_string(),
        "AMZN".to_string(),
    ];

    let history = match stock_data(&tickers, DEFAULT_LOOKBACK_DAYS).await {
        LoadOutcome::Loaded(history) => history,
        LoadOutcome::NoData { reason } => {
            println!("No data: {}", reason);
            return Ok(());
        }
    };

    let prices = history.adj_close().ok_or("download has no Adj Close table")?;
    let returns = prices.pct_change();

    // Example 1: descriptive statistics of daily returns
    println!("\nExample 1: Descriptive statistics of returns");
    let stats = descriptive_stats(&returns, &tickers)?;
    println!("{}", format_stats_table(&stats));

    // Example 2: levels are usually not stationary, returns usually are
    println!("\nExample 2: ADF test on prices and on returns");
    println!("{}", format_stationarity_table(&ts_stationarity(prices)));
    println!();
    println!("{}", format_stationarity_table(&ts_stationarity(&returns)));

    // Example 3: charts
    println!("\nExample 3: Charts");
    plot_histograms(&returns, &tickers, "basic_analysis_histograms.svg")?;
    tracking_plot(
        prices,
        &tickers,
        &PlotLabels::new("Adjusted Close", "Date", "Price (USD)"),
        "basic_analysis_tracking.svg",
    )?;
    println!("Wrote basic_analysis_histograms.svg and basic_analysis_tracking.svg");

    Ok(())
}
