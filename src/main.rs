pub mod config;
pub mod report;

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing before loading config so config errors are logged too
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let app_config = config::ReportConfig::load().context("Failed to load configuration")?;

    // Set a global span with the run's environment for all subsequent logs
    let _span = tracing::info_span!("report", env = %app_config.environment).entered();

    tracing::info!("Starting tickerscope-report at {}", chrono::Utc::now().to_rfc3339());
    tracing::info!(
        tickers = ?app_config.tickers,
        lookback_days = app_config.lookback_days,
        field = %app_config.price_field,
        output_dir = %app_config.output_dir.display(),
        "Loaded configuration"
    );

    let summary = report::run(&app_config).await?;

    tracing::info!(
        tickers = summary.tickers,
        rows = summary.rows,
        stationary_returns = summary.stationary_returns,
        "Report complete"
    );
    for file in &summary.files {
        println!("{}", file.display());
    }

    Ok(())
}
