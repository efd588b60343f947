use crate::models::{DailyBar, SymbolHistory};
use crate::services::{DateWindow, HistoryProvider, ProviderError};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Plain equities, indices (^GSPC), share classes (BRK-B), FX (EURUSD=X), foreign listings (0700.HK)
static SYMBOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\^?[A-Za-z0-9][A-Za-z0-9.=\-]{0,15}$").expect("symbol pattern is valid")
});

/// Yahoo Finance v8 chart endpoint. One request per symbol, no retries.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: YAHOO_CHART_URL.to_string(),
        })
    }

    /// Point the client at another host serving the same API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        self
    }

    pub fn validate_symbol(symbol: &str) -> Result<(), ProviderError> {
        if SYMBOL_PATTERN.is_match(symbol) {
            Ok(())
        } else {
            Err(ProviderError::InvalidSymbol(symbol.to_string()))
        }
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}{}", self.base_url, symbol)
    }
}

#[async_trait::async_trait]
impl HistoryProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn daily_history(
        &self,
        symbol: &str,
        window: &DateWindow,
    ) -> Result<SymbolHistory, ProviderError> {
        Self::validate_symbol(symbol)?;

        let response = self
            .client
            .get(self.chart_url(symbol))
            .header("Accept", "application/json")
            .query(&[
                ("period1", window.start.timestamp().to_string()),
                ("period2", window.end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<Value>().await?;
        let history = parse_chart_response(symbol, &body)?;
        debug!(symbol, bars = history.bars.len(), "Parsed chart response");
        Ok(history)
    }
}

/// Turn a v8 chart payload into daily bars, one per exchange-local date.
///
/// Null cells become `None`; rows without any price are dropped. When the
/// endpoint repeats a date (the live bar), the last row wins.
pub fn parse_chart_response(symbol: &str, body: &Value) -> Result<SymbolHistory, ProviderError> {
    let chart = body
        .get("chart")
        .ok_or_else(|| ProviderError::InvalidResponse("missing key: chart".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error["description"].as_str().unwrap_or("unknown error");
        return Err(ProviderError::InvalidResponse(format!("{}: {}", symbol, description)));
    }

    let result = match chart["result"].as_array().and_then(|r| r.first()) {
        Some(result) => result,
        None => return Err(ProviderError::NoData(symbol.to_string())),
    };

    let timestamps = match result["timestamp"].as_array() {
        Some(timestamps) if !timestamps.is_empty() => timestamps,
        _ => return Err(ProviderError::NoData(symbol.to_string())),
    };
    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);

    let quote = &result["indicators"]["quote"][0];
    let series = |name: &str| -> Result<&Vec<Value>, ProviderError> {
        quote[name]
            .as_array()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("missing quote series: {}", name)))
    };
    let opens = series("open")?;
    let highs = series("high")?;
    let lows = series("low")?;
    let closes = series("close")?;
    let volumes = series("volume")?;
    let adj_closes = result["indicators"]["adjclose"][0]["adjclose"].as_array();

    let length = timestamps.len();
    let lengths_match = [opens.len(), highs.len(), lows.len(), closes.len(), volumes.len()]
        .iter()
        .chain(adj_closes.map(|a| a.len()).as_ref())
        .all(|&len| len == length);
    if !lengths_match {
        return Err(ProviderError::InvalidResponse(
            "Inconsistent array lengths".to_string(),
        ));
    }

    let mut by_date: BTreeMap<NaiveDate, DailyBar> = BTreeMap::new();
    for i in 0..length {
        let timestamp = timestamps[i].as_i64().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Invalid timestamp at index {}: {:?}", i, timestamps[i]))
        })?;
        let date = DateTime::from_timestamp(timestamp + gmt_offset, 0)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("Timestamp {} out of range", timestamp))
            })?
            .date_naive();

        let close = closes[i].as_f64();
        let bar = DailyBar {
            date,
            open: opens[i].as_f64(),
            high: highs[i].as_f64(),
            low: lows[i].as_f64(),
            close,
            adj_close: adj_closes.map_or(close, |a| a[i].as_f64()),
            volume: volumes[i].as_f64(),
        };
        if bar.open.is_none() && bar.high.is_none() && bar.low.is_none() && bar.close.is_none() {
            continue;
        }
        by_date.insert(date, bar);
    }

    if by_date.is_empty() {
        return Err(ProviderError::NoData(symbol.to_string()));
    }

    Ok(SymbolHistory {
        symbol: symbol.to_string(),
        bars: by_date.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2024-03-04 and 2024-03-05 14:30 UTC, New York offset
    fn sample() -> Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                    "timestamp": [1709562600, 1709649000, 1709649060],
                    "indicators": {
                        "quote": [{
                            "open": [176.15, 170.76, 170.80],
                            "high": [176.90, 172.04, 172.10],
                            "low": [173.79, 169.62, 169.60],
                            "close": [175.10, 170.12, 170.20],
                            "volume": [81510100, 95132400, 95200000]
                        }],
                        "adjclose": [{ "adjclose": [174.50, 169.55, 169.62] }]
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_symbol_validation() {
        for symbol in ["AAPL", "^GSPC", "BRK-B", "EURUSD=X", "0700.HK", "msft"] {
            assert!(YahooClient::validate_symbol(symbol).is_ok(), "{}", symbol);
        }
        for symbol in ["", "AA PL", "../etc", "AAPL?x=1", "-ABC"] {
            assert!(YahooClient::validate_symbol(symbol).is_err(), "{}", symbol);
        }
    }

    #[test]
    fn test_parse_chart_response() {
        let history = parse_chart_response("AAPL", &sample()).unwrap();
        assert_eq!(history.symbol, "AAPL");
        assert_eq!(history.bars.len(), 2);

        let first = &history.bars[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(first.close, Some(175.10));
        assert_eq!(first.adj_close, Some(174.50));
        assert_eq!(first.volume, Some(81510100.0));

        // repeated date keeps the later row
        let second = &history.bars[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(second.close, Some(170.20));
    }

    #[test]
    fn test_null_cells_and_missing_adjclose() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 0 },
                    "timestamp": [1709510400, 1709596800],
                    "indicators": {
                        "quote": [{
                            "open": [null, 10.0],
                            "high": [null, 11.0],
                            "low": [null, 9.0],
                            "close": [null, 10.5],
                            "volume": [null, null]
                        }]
                    }
                }],
                "error": null
            }
        });

        let history = parse_chart_response("X", &body).unwrap();
        assert_eq!(history.bars.len(), 1);
        assert_eq!(history.bars[0].adj_close, Some(10.5));
        assert_eq!(history.bars[0].volume, None);
    }

    #[test]
    fn test_error_payloads() {
        let not_found = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        assert!(matches!(
            parse_chart_response("NOPE", &not_found),
            Err(ProviderError::InvalidResponse(message)) if message.contains("delisted")
        ));

        let empty = json!({ "chart": { "result": [{ "meta": {}, "indicators": {} }], "error": null } });
        assert!(matches!(
            parse_chart_response("EMPTY", &empty),
            Err(ProviderError::NoData(_))
        ));

        assert!(matches!(
            parse_chart_response("X", &json!({})),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_client_creation() {
        let client = YahooClient::new().unwrap().with_base_url("http://localhost:9999/chart");
        assert_eq!(client.chart_url("AAPL"), "http://localhost:9999/chart/AAPL");
        assert_eq!(client.name(), "yahoo");
    }
}
