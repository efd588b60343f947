//! # tickerscope - exploratory analysis of financial time series
//!
//! Three independent, stateless pieces:
//! - a loader that downloads daily price history for a list of tickers over
//!   a trailing window of days,
//! - descriptive statistics and an Augmented Dickey-Fuller stationarity test
//!   over date-indexed tables,
//! - SVG charts of those tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickerscope::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
//!     let history = match stock_data(&tickers, DEFAULT_LOOKBACK_DAYS).await {
//!         LoadOutcome::Loaded(history) => history,
//!         LoadOutcome::NoData { reason } => anyhow::bail!(reason),
//!     };
//!
//!     let prices = history.adj_close().expect("loaded histories carry every field");
//!     let returns = prices.pct_change();
//!     for row in descriptive_stats(&returns, &tickers)? {
//!         println!("{}: mean {:.4}", row.ticker, row.mean);
//!     }
//!     plot_histograms(&returns, &tickers, "histograms.svg")?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod visualisation;

// Prelude for convenient imports
pub mod prelude {
    //! The types and functions most callers need:
    //! ```rust
    //! use tickerscope::prelude::*;
    //! ```

    pub use crate::analysis::{
        acf, descriptive_stats, pacf, seasonal_decompose, ts_stationarity, ACF_LAGS,
        DECOMPOSITION_PERIOD,
    };
    pub use crate::error::{AnalysisError, ChartError, TableError};
    pub use crate::models::{
        AdfResult, DescriptiveStats, PriceField, PriceHistory, StationarityRow, Table,
    };
    pub use crate::services::{
        stock_data, LoadOutcome, ProviderError, YahooClient, DEFAULT_LOOKBACK_DAYS,
    };
    pub use crate::visualisation::{
        acf_pacf, moving_averages, plot_boxplots, plot_histograms, tracking_plot,
        ts_decomposition, PlotLabels,
    };
}

// Re-export some commonly used utilities
pub use utils::{init_logger, Logger, Timer};
