use crate::models::PriceHistory;
use crate::services::{DateWindow, HistoryProvider, ProviderError, YahooClient};
use crate::utils::{log_fetch, Timer};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::error;

/// Trailing window used when the caller does not pick one
pub const DEFAULT_LOOKBACK_DAYS: u32 = 200;

/// Result of a download: the data, or an explicit "nothing usable came back".
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(PriceHistory),
    NoData { reason: String },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn history(&self) -> Option<&PriceHistory> {
        match self {
            LoadOutcome::Loaded(history) => Some(history),
            LoadOutcome::NoData { .. } => None,
        }
    }

    pub fn into_history(self) -> Option<PriceHistory> {
        match self {
            LoadOutcome::Loaded(history) => Some(history),
            LoadOutcome::NoData { .. } => None,
        }
    }
}

/// Download daily history for `tickers` over the last `days` days from Yahoo Finance.
///
/// Never fails: every problem is logged and reported as [`LoadOutcome::NoData`].
pub async fn stock_data(tickers: &[String], days: u32) -> LoadOutcome {
    match YahooClient::new() {
        Ok(client) => stock_data_with(&client, tickers, days, Utc::now()).await,
        Err(e) => no_data(e),
    }
}

/// [`stock_data`] against any provider, with the window ending at `now`.
pub async fn stock_data_with<P>(
    provider: &P,
    tickers: &[String],
    days: u32,
    now: DateTime<Utc>,
) -> LoadOutcome
where
    P: HistoryProvider + ?Sized,
{
    let timer = Timer::start("stock_data");
    match fetch_history(provider, tickers, days, now).await {
        Ok(history) => {
            log_fetch(&format!(
                "Loaded {} tickers, {} rows from {} ({} to {})",
                history.tickers().len(),
                history.index().len(),
                provider.name(),
                history.first_date().map(|d| d.to_string()).unwrap_or_default(),
                history.last_date().map(|d| d.to_string()).unwrap_or_default(),
            ));
            timer.log_elapsed("FETCH");
            LoadOutcome::Loaded(history)
        }
        Err(e) => no_data(e),
    }
}

async fn fetch_history<P>(
    provider: &P,
    tickers: &[String],
    days: u32,
    now: DateTime<Utc>,
) -> Result<PriceHistory, ProviderError>
where
    P: HistoryProvider + ?Sized,
{
    if tickers.is_empty() {
        return Err(ProviderError::EmptyTickerList);
    }
    let window = DateWindow::trailing(days, now)?;

    let mut seen = HashSet::new();
    let mut histories = Vec::with_capacity(tickers.len());
    for ticker in tickers.iter().filter(|t| seen.insert(t.as_str())) {
        log_fetch(&format!(
            "Requesting {} from {} ({} days)",
            ticker,
            provider.name(),
            window.days()
        ));
        histories.push(provider.daily_history(ticker, &window).await?);
    }

    if histories.iter().all(|history| history.bars.is_empty()) {
        return Err(ProviderError::NoData(tickers.join(",")));
    }

    Ok(PriceHistory::from_symbols(&histories)?)
}

fn no_data(error: ProviderError) -> LoadOutcome {
    error!(%error, "Failed to load stock data");
    LoadOutcome::NoData {
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyBar, PriceField, SymbolHistory};
    use chrono::{Datelike, Duration, NaiveDate, TimeZone, Weekday};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Weekday bars across the requested window; fails for symbols in `broken`.
    struct MockProvider {
        broken: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(broken: Vec<&'static str>) -> Self {
            Self {
                broken,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl HistoryProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn daily_history(
            &self,
            symbol: &str,
            window: &DateWindow,
        ) -> Result<SymbolHistory, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&symbol) {
                return Err(ProviderError::Status {
                    symbol: symbol.to_string(),
                    status: 404,
                });
            }

            let mut bars = Vec::new();
            let mut date = window.start.date_naive();
            let mut price = 100.0;
            while date <= window.end.date_naive() {
                if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    price += 0.5;
                    bars.push(DailyBar {
                        date,
                        open: Some(price - 0.2),
                        high: Some(price + 1.0),
                        low: Some(price - 1.0),
                        close: Some(price),
                        adj_close: Some(price),
                        volume: Some(1_000_000.0),
                    });
                }
                date += Duration::days(1);
            }
            Ok(SymbolHistory {
                symbol: symbol.to_string(),
                bars,
            })
        }
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 21, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_loads_trailing_window() {
        let provider = MockProvider::new(vec![]);
        let outcome =
            stock_data_with(&provider, &tickers(&["AAPL", "MSFT"]), DEFAULT_LOOKBACK_DAYS, now()).await;

        let history = outcome.into_history().expect("data should load");
        assert_eq!(history.tickers(), &["AAPL", "MSFT"]);
        assert_eq!(history.last_date(), NaiveDate::from_ymd_opt(2024, 6, 3));
        assert_eq!(history.first_date(), NaiveDate::from_ymd_opt(2023, 11, 16));

        let span = history.last_date().unwrap() - history.first_date().unwrap();
        assert!(span.num_days() <= i64::from(DEFAULT_LOOKBACK_DAYS));

        for field in PriceField::ALL {
            assert!(history.field(field).is_some());
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_no_data() {
        let provider = MockProvider::new(vec!["NOPE"]);
        let outcome = stock_data_with(&provider, &tickers(&["AAPL", "NOPE"]), 30, now()).await;

        match outcome {
            LoadOutcome::NoData { reason } => assert!(reason.contains("404")),
            LoadOutcome::Loaded(_) => panic!("a failing symbol must not load"),
        }
    }

    #[tokio::test]
    async fn test_empty_ticker_list_never_calls_provider() {
        let provider = MockProvider::new(vec![]);
        let outcome = stock_data_with(&provider, &[], 30, now()).await;
        assert!(!outcome.is_loaded());
        assert_eq!(provider.calls(), 0);

        let outcome = stock_data(&[], DEFAULT_LOOKBACK_DAYS).await;
        assert!(matches!(outcome, LoadOutcome::NoData { .. }));
    }

    #[tokio::test]
    async fn test_zero_day_window_is_no_data() {
        let provider = MockProvider::new(vec![]);
        let outcome = stock_data_with(&provider, &tickers(&["AAPL"]), 0, now()).await;
        assert!(outcome.history().is_none());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_tickers_are_fetched_once() {
        let provider = MockProvider::new(vec![]);
        let outcome = stock_data_with(&provider, &tickers(&["AAPL", "AAPL"]), 10, now()).await;
        assert!(outcome.is_loaded());
        assert_eq!(provider.calls(), 1);
    }
}
