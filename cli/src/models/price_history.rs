use crate::error::TableError;
use crate::models::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    #[serde(rename = "Adj Close")]
    AdjClose,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::AdjClose,
        PriceField::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
            PriceField::AdjClose => "Adj Close",
            PriceField::Volume => "Volume",
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "adj close" | "adjclose" => Ok(PriceField::AdjClose),
            "volume" => Ok(PriceField::Volume),
            _ => Err(format!("unknown price field: {}", s)),
        }
    }
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trading day for one symbol; fields the provider left empty are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

impl DailyBar {
    pub fn value(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Daily history of a single symbol as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolHistory {
    pub symbol: String,
    pub bars: Vec<DailyBar>,
}

/// Price/volume history for several symbols: one [`Table`] per [`PriceField`],
/// all sharing the same dates and ticker columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    fields: BTreeMap<PriceField, Table>,
}

impl PriceHistory {
    /// Outer-join the symbols on date. Days a symbol did not trade are missing values.
    pub fn from_symbols(histories: &[SymbolHistory]) -> Result<Self, TableError> {
        let index: Vec<NaiveDate> = histories
            .iter()
            .flat_map(|history| history.bars.iter().map(|bar| bar.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut fields = BTreeMap::new();
        for field in PriceField::ALL {
            let columns = histories
                .iter()
                .map(|history| {
                    let by_date: HashMap<NaiveDate, f64> = history
                        .bars
                        .iter()
                        .filter_map(|bar| bar.value(field).map(|value| (bar.date, value)))
                        .collect();
                    let values = index
                        .iter()
                        .map(|date| by_date.get(date).copied().unwrap_or(f64::NAN))
                        .collect();
                    (history.symbol.clone(), values)
                })
                .collect();
            fields.insert(field, Table::new(index.clone(), columns)?);
        }

        Ok(Self { fields })
    }

    pub fn field(&self, field: PriceField) -> Option<&Table> {
        self.fields.get(&field)
    }

    pub fn adj_close(&self) -> Option<&Table> {
        self.field(PriceField::AdjClose)
    }

    pub fn volume(&self) -> Option<&Table> {
        self.field(PriceField::Volume)
    }

    pub fn tickers(&self) -> &[String] {
        self.fields
            .values()
            .next()
            .map(|table| table.columns())
            .unwrap_or(&[])
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.fields
            .values()
            .next()
            .map(|table| table.index())
            .unwrap_or(&[])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index().first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index().last().copied()
    }
}
