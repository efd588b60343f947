use crate::error::TableError;
use crate::utils::{format_date, parse_date};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

/// Name of the first CSV column, holding the row dates
pub const DATE_COLUMN: &str = "date";

/// Date-indexed, ticker-labeled numeric table.
///
/// Rows are ordered by strictly increasing date, columns are named by ticker
/// symbol and missing cells are `f64::NAN`. A table is never mutated in
/// place: derivations such as [`Table::pct_change`] return a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from a date index and `(name, values)` columns.
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, TableError> {
        if let Some(pair) = index.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(TableError::UnsortedIndex(pair[1]));
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn(name));
            }
            if column.len() != index.len() {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: index.len(),
                    found: column.len(),
                });
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            index,
            columns: names,
            values,
        })
    }

    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|column| column == name)
            .map(|i| self.values[i].as_slice())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Requested tickers that exist as columns, in request order, without repeats.
    pub fn present_tickers(&self, tickers: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        tickers
            .iter()
            .filter(|ticker| self.has_column(ticker))
            .filter(|ticker| seen.insert(ticker.as_str()))
            .cloned()
            .collect()
    }

    /// Sub-table with the requested tickers that exist; absent ones are dropped.
    pub fn select(&self, tickers: &[String]) -> Table {
        let columns = self
            .present_tickers(tickers)
            .into_iter()
            .filter_map(|ticker| {
                let values = self.column(&ticker)?.to_vec();
                Some((ticker, values))
            })
            .collect::<Vec<_>>();

        self.derived(columns)
    }

    /// Non-missing values of a column together with their dates.
    pub fn dropna_column(&self, name: &str) -> Option<(Vec<NaiveDate>, Vec<f64>)> {
        let column = self.column(name)?;
        Some(
            self.index
                .iter()
                .zip(column.iter())
                .filter(|(_, value)| value.is_finite())
                .map(|(date, value)| (*date, *value))
                .unzip(),
        )
    }

    /// Simple returns `x[t] / x[t-1] - 1`; the first row is missing.
    pub fn pct_change(&self) -> Table {
        self.map_columns(|values| {
            let mut out = vec![f64::NAN; values.len()];
            for t in 1..values.len() {
                out[t] = values[t] / values[t - 1] - 1.0;
            }
            out
        })
    }

    /// Log returns `ln(x[t] / x[t-1])`; the first row is missing.
    pub fn log_returns(&self) -> Table {
        self.map_columns(|values| {
            let mut out = vec![f64::NAN; values.len()];
            for t in 1..values.len() {
                out[t] = (values[t] / values[t - 1]).ln();
            }
            out
        })
    }

    /// Trailing mean over `window` rows, missing until a full window of values is seen.
    pub fn rolling_mean(&self, window: usize) -> Table {
        self.map_columns(|values| {
            let mut out = vec![f64::NAN; values.len()];
            if window == 0 {
                return out;
            }
            for t in (window - 1)..values.len() {
                let slice = &values[t + 1 - window..=t];
                if slice.iter().all(|v| v.is_finite()) {
                    out[t] = slice.iter().sum::<f64>() / window as f64;
                }
            }
            out
        })
    }

    /// Exponentially weighted mean with `alpha = 2 / (span + 1)`.
    ///
    /// Recursive form seeded with the first observation; a missing input
    /// repeats the previous mean.
    pub fn ewm_mean(&self, span: usize) -> Table {
        let alpha = 2.0 / (span.max(1) as f64 + 1.0);
        self.map_columns(|values| {
            let mut out = vec![f64::NAN; values.len()];
            let mut current: Option<f64> = None;
            for (t, value) in values.iter().enumerate() {
                if value.is_finite() {
                    current = Some(match current {
                        Some(prev) => (1.0 - alpha) * prev + alpha * value,
                        None => *value,
                    });
                }
                if let Some(mean) = current {
                    out[t] = mean;
                }
            }
            out
        })
    }

    /// Read a table whose header is `date,<ticker>,<ticker>...`.
    ///
    /// Rows may come in any order and are sorted by date; a repeated date is
    /// an error. Empty cells are missing values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut header_iter = headers.iter();
        match header_iter.next() {
            Some(first) if first.trim().eq_ignore_ascii_case(DATE_COLUMN) => {}
            _ => return Err(TableError::MissingDateColumn),
        }
        let names: Vec<String> = header_iter.map(|h| h.trim().to_string()).collect();

        let mut rows: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let raw_date = record.get(0).unwrap_or_default().trim();
            let date = parse_date(raw_date).map_err(|source| {
                TableError::InvalidDate {
                    value: raw_date.to_string(),
                    source,
                }
            })?;

            let mut row = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let raw = record.get(i + 1).unwrap_or_default().trim();
                row.push(parse_cell(name, raw)?);
            }
            if rows.insert(date, row).is_some() {
                return Err(TableError::DuplicateDate(date));
            }
        }

        let index: Vec<NaiveDate> = rows.keys().copied().collect();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, rows.values().map(|row| row[i]).collect()))
            .collect();

        Table::new(index, columns)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![DATE_COLUMN.to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (row, date) in self.index.iter().enumerate() {
            let mut record = vec![format_date(*date)];
            record.extend(self.values.iter().map(|column| {
                let value = column[row];
                if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                }
            }));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.to_csv_writer(file)
    }

    fn map_columns<F>(&self, f: F) -> Table
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let columns = self
            .iter_columns()
            .map(|(name, values)| (name.to_string(), f(values)))
            .collect();
        self.derived(columns)
    }

    // Columns derived from this table always share its index and unique names.
    fn derived(&self, columns: Vec<(String, Vec<f64>)>) -> Table {
        let (columns, values) = columns.into_iter().unzip();
        Table {
            index: self.index.clone(),
            columns,
            values,
        }
    }
}

/// Finite values of a series, in order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

fn parse_cell(column: &str, raw: &str) -> Result<f64, TableError> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| TableError::InvalidNumber {
        column: column.to_string(),
        value: raw.to_string(),
    })
}
