use crate::error::TableError;
use crate::models::SymbolHistory;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider answered {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("invalid ticker symbol {0:?}")]
    InvalidSymbol(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("ticker list is empty")]
    EmptyTickerList,

    #[error("lookback window must be at least one day")]
    InvalidWindow,

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Half-open time range `[start, end)` requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// The `days` days up to `now`.
    pub fn trailing(days: u32, now: DateTime<Utc>) -> Result<Self, ProviderError> {
        if days == 0 {
            return Err(ProviderError::InvalidWindow);
        }
        Ok(Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Source of daily price history for one symbol at a time.
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn daily_history(
        &self,
        symbol: &str,
        window: &DateWindow,
    ) -> Result<SymbolHistory, ProviderError>;
}
