use crate::config::ReportConfig;
use anyhow::{Context, bail};
use std::fs;
use std::path::PathBuf;
use tickerscope::{
    analysis::{descriptive_stats, ts_stationarity},
    models::PriceHistory,
    services::{LoadOutcome, stock_data},
    utils::{Timer, write_csv_rows, write_stationarity_csv},
    visualisation::{
        PlotLabels, acf_pacf, moving_averages, plot_boxplots, plot_histograms, tracking_plot,
        ts_decomposition,
    },
};
use tracing::{info, warn};

/// What a report run produced
#[derive(Debug)]
pub struct ReportSummary {
    pub tickers: usize,
    pub rows: usize,
    pub stationary_returns: usize,
    pub files: Vec<PathBuf>,
}

/// Download the configured tickers and write the report.
pub async fn run(config: &ReportConfig) -> anyhow::Result<ReportSummary> {
    let history = match stock_data(&config.tickers, config.lookback_days).await {
        LoadOutcome::Loaded(history) => history,
        LoadOutcome::NoData { reason } => bail!("no data for {:?}: {}", config.tickers, reason),
    };
    write_report(config, &history)
}

/// Prices, returns statistics, stationarity tables and charts of one download.
pub fn write_report(config: &ReportConfig, history: &PriceHistory) -> anyhow::Result<ReportSummary> {
    let timer = Timer::start("report");
    let dir = &config.output_dir;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let prices = history
        .field(config.price_field)
        .with_context(|| format!("{} missing from the download", config.price_field))?;
    let returns = prices.pct_change();
    let mut files = Vec::new();

    let path = dir.join("prices.csv");
    prices.to_csv_path(&path)?;
    files.push(path);

    let stats = descriptive_stats(&returns, &config.tickers)?;
    let path = dir.join("return_stats.csv");
    write_csv_rows(&path, &stats)?;
    files.push(path);

    let price_tests = ts_stationarity(prices);
    let path = dir.join("stationarity_prices.csv");
    write_stationarity_csv(&path, &price_tests)?;
    files.push(path);

    let return_tests = ts_stationarity(&returns);
    let path = dir.join("stationarity_returns.csv");
    write_stationarity_csv(&path, &return_tests)?;
    files.push(path);

    let failed = return_tests.iter().filter(|row| row.test.is_err()).count();
    if failed > 0 {
        warn!(failed, "Some return series could not be tested");
    }
    let stationary_returns = return_tests.iter().filter(|row| row.label() == "Yes").count();

    let selected = prices.select(&config.tickers);
    let path = dir.join("tracking.svg");
    tracking_plot(
        prices,
        &config.tickers,
        &PlotLabels::new(
            format!("{} over the last {} days", config.price_field, config.lookback_days),
            "Date",
            config.price_field.to_string(),
        ),
        &path,
    )?;
    files.push(path);

    let path = dir.join("return_histograms.svg");
    plot_histograms(&returns, &config.tickers, &path)?;
    files.push(path);

    let path = dir.join("return_boxplots.svg");
    plot_boxplots(&returns, &config.tickers, &path)?;
    files.push(path);

    let path = dir.join("decomposition.svg");
    ts_decomposition(&selected, &path)?;
    files.push(path);

    let path = dir.join("acf_pacf.svg");
    acf_pacf(&returns.select(&config.tickers), &path)?;
    files.push(path);

    let path = dir.join("moving_averages.svg");
    moving_averages(
        &selected,
        &selected.rolling_mean(config.ma_window),
        &selected.ewm_mean(config.ema_span),
        &path,
    )?;
    files.push(path);

    info!(
        tickers = stats.len(),
        rows = prices.len(),
        stationary_returns,
        files = files.len(),
        dir = %dir.display(),
        "Report written"
    );
    timer.log_elapsed("REPORT");

    Ok(ReportSummary {
        tickers: stats.len(),
        rows: prices.len(),
        stationary_returns,
        files,
    })
}
