use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickerscope::{
    analysis::{descriptive_stats, ts_stationarity},
    models::{PriceField, Table},
    services::{stock_data, LoadOutcome, DEFAULT_LOOKBACK_DAYS},
    utils::{
        format_stats_table, format_stationarity_table, init_logger, log_analysis,
        trading_days_between, write_csv_rows, write_stationarity_csv,
    },
    visualisation::{
        acf_pacf, moving_averages, plot_boxplots, plot_histograms, tracking_plot,
        ts_decomposition, PlotLabels,
    },
};

#[derive(Parser)]
#[command(name = "tickerscope")]
#[command(about = "Download stock prices, summarise them and chart them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download daily prices for ticker(s) into a CSV table
    Download {
        /// Ticker symbol(s) (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        tickers: Vec<String>,
        /// Trailing window in calendar days
        #[arg(short, long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
        days: u32,
        /// Price field to export (Open, High, Low, Close, Adj Close, Volume)
        #[arg(short, long, default_value = "Adj Close")]
        field: PriceField,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Descriptive statistics of a CSV table
    Describe {
        #[arg(short, long)]
        input: PathBuf,
        /// Ticker symbol(s) to include (comma-separated, default all columns)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
        /// Analyse simple returns instead of levels
        #[arg(long)]
        returns: bool,
        /// Also write the statistics to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Augmented Dickey-Fuller test for every column of a CSV table
    Stationarity {
        #[arg(short, long)]
        input: PathBuf,
        /// Test simple returns instead of levels
        #[arg(long)]
        returns: bool,
        /// Also write the results to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render every chart of a CSV table into a directory
    Charts {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Ticker symbol(s) for the per-ticker charts (comma-separated, default all columns)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
        /// Moving average window
        #[arg(long, default_value_t = 20)]
        ma_window: usize,
        /// Exponential moving average span
        #[arg(long, default_value_t = 20)]
        ema_span: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logger()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            tickers,
            days,
            field,
            output,
        } => {
            let history = match stock_data(&tickers, days).await {
                LoadOutcome::Loaded(history) => history,
                LoadOutcome::NoData { reason } => anyhow::bail!("no data downloaded: {}", reason),
            };
            let table = history
                .field(field)
                .with_context(|| format!("{} missing from the download", field))?;
            table
                .to_csv_path(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if let (Some(first), Some(last)) = (history.first_date(), history.last_date()) {
                println!(
                    "Wrote {} rows x {} tickers of {} to {} ({} to {}, {} trading days)",
                    table.len(),
                    table.width(),
                    field,
                    output.display(),
                    first,
                    last,
                    trading_days_between(first, last)
                );
            }
        }
        Commands::Describe {
            input,
            tickers,
            returns,
            csv,
        } => {
            let data = load_table(&input, returns)?;
            let tickers = or_all_columns(tickers, &data);
            let stats = descriptive_stats(&data, &tickers)?;
            log_analysis(&format!("Described {} of {} tickers", stats.len(), tickers.len()));

            println!("{}", format_stats_table(&stats));
            if let Some(path) = csv {
                write_csv_rows(&path, &stats)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Commands::Stationarity {
            input,
            returns,
            csv,
        } => {
            let data = load_table(&input, returns)?;
            let rows = ts_stationarity(&data);
            let stationary = rows.iter().filter(|row| row.label() == "Yes").count();
            log_analysis(&format!("{} of {} columns are stationary", stationary, rows.len()));

            println!("{}", format_stationarity_table(&rows));
            if let Some(path) = csv {
                write_stationarity_csv(&path, &rows)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Commands::Charts {
            input,
            output_dir,
            tickers,
            ma_window,
            ema_span,
        } => {
            let prices = load_table(&input, false)?;
            let tickers = or_all_columns(tickers, &prices);
            let returns = prices.pct_change();
            let selected = prices.select(&tickers);

            tracking_plot(
                &prices,
                &tickers,
                &PlotLabels::new("Price Tracking", "Date", "Price"),
                output_dir.join("tracking.svg"),
            )?;
            plot_histograms(&returns, &tickers, output_dir.join("histograms.svg"))?;
            plot_boxplots(&returns, &tickers, output_dir.join("boxplots.svg"))?;
            ts_decomposition(&selected, output_dir.join("decomposition.svg"))?;
            acf_pacf(&returns.select(&tickers), output_dir.join("acf_pacf.svg"))?;
            moving_averages(
                &selected,
                &selected.rolling_mean(ma_window),
                &selected.ewm_mean(ema_span),
                output_dir.join("moving_averages.svg"),
            )?;

            println!("Charts written to {}", output_dir.display());
        }
    }

    Ok(())
}

fn load_table(path: &Path, returns: bool) -> anyhow::Result<Table> {
    let table = Table::from_csv_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(if returns { table.pct_change() } else { table })
}

fn or_all_columns(tickers: Vec<String>, data: &Table) -> Vec<String> {
    if tickers.is_empty() {
        data.columns().to_vec()
    } else {
        tickers
    }
}
