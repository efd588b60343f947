//! Plain-text tables for the terminal and CSV exports of result rows.

use crate::models::{DescriptiveStats, StationarityRow};
use serde::Serialize;
use std::path::Path;

/// Fixed 4-decimal rendering; missing values print as "NaN".
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", value)
    }
}

/// Render rows as an aligned text table with a header rule.
pub fn format_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i == 0 {
                    format!("{:<width$}", cell, width = width)
                } else {
                    format!("{:>width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(header.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.extend(
        rows.iter()
            .map(|row| render(row.iter().map(String::as_str).collect())),
    );
    lines.join("\n")
}

pub fn format_stats_table(stats: &[DescriptiveStats]) -> String {
    let header = [
        "Ticker", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skewness", "kurtosis",
    ];
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            let mut row = vec![s.ticker.clone(), s.count.to_string()];
            row.extend(
                [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max, s.skewness, s.kurtosis]
                    .into_iter()
                    .map(format_value),
            );
            row
        })
        .collect();
    format_table(&header, &rows)
}

pub fn format_stationarity_table(rows: &[StationarityRow]) -> String {
    let header = ["Ticker", "ADF Statistic", "p-value", "Stationary"];
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.ticker.clone(),
                row.statistic().map(format_value).unwrap_or_else(|| "-".to_string()),
                row.p_value().map(format_value).unwrap_or_else(|| "-".to_string()),
                row.label().to_string(),
            ]
        })
        .collect();
    format_table(&header, &body)
}

/// Write serializable rows to a CSV file with a header taken from the field names.
pub fn write_csv_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_stationarity_csv(
    path: impl AsRef<Path>,
    rows: &[StationarityRow],
) -> Result<(), csv::Error> {
    let summaries: Vec<_> = rows.iter().map(StationarityRow::summary).collect();
    write_csv_rows(path, &summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::models::{AdfResult, CriticalValues};

    fn stats_row(ticker: &str) -> DescriptiveStats {
        DescriptiveStats {
            ticker: ticker.to_string(),
            count: 3,
            mean: 0.5,
            std: 0.25,
            min: 0.1,
            q25: 0.2,
            median: 0.5,
            q75: 0.8,
            max: 0.9,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
        }
    }

    fn stationarity_rows() -> Vec<StationarityRow> {
        vec![
            StationarityRow {
                ticker: "AAPL".to_string(),
                test: Ok(AdfResult {
                    statistic: -5.5,
                    p_value: 0.0001,
                    used_lag: 1,
                    nobs: 197,
                    critical_values: CriticalValues {
                        one_percent: -3.46,
                        five_percent: -2.87,
                        ten_percent: -2.57,
                    },
                    stationary: true,
                }),
            },
            StationarityRow {
                ticker: "DEAD".to_string(),
                test: Err(AnalysisError::EmptySeries),
            },
        ]
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.123456), "0.1235");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_stats_table_layout() {
        let text = format_stats_table(&[stats_row("AAPL"), stats_row("MSFT")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Ticker"));
        assert!(lines[0].contains("25%"));
        assert!(lines[1].starts_with("------"));
        assert!(lines[2].starts_with("AAPL"));
        assert!(lines[3].contains("NaN"));
    }

    #[test]
    fn test_stationarity_table_marks_failures() {
        let text = format_stationarity_table(&stationarity_rows());
        assert!(text.contains("Yes"));
        let failed = text.lines().find(|l| l.starts_with("DEAD")).unwrap();
        assert!(failed.ends_with("Failed"));
        assert!(failed.contains('-'));
    }

    #[test]
    fn test_csv_exports() {
        let dir = tempfile::tempdir().unwrap();

        let stats_path = dir.path().join("stats.csv");
        write_csv_rows(&stats_path, &[stats_row("AAPL")]).unwrap();
        let text = std::fs::read_to_string(&stats_path).unwrap();
        assert!(text.starts_with("ticker,count,mean,std,min,25%,50%,75%,max,skewness,kurtosis"));

        let adf_path = dir.path().join("stationarity.csv");
        write_stationarity_csv(&adf_path, &stationarity_rows()).unwrap();
        let text = std::fs::read_to_string(&adf_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Ticker,ADF Statistic,p-value,Stationary,used_lag,nobs,error"
        );
        assert!(lines[1].starts_with("AAPL,-5.5,0.0001,Yes,1,197,"));
        assert!(lines[2].starts_with("DEAD,,,Failed,,,"));
    }
}
