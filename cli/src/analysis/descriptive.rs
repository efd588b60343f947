use crate::error::AnalysisError;
use crate::models::{finite_values, DescriptiveStats, Table};
use tracing::{debug, warn};

/// Descriptive statistics for the requested tickers that exist in `data`.
///
/// Tickers missing from the table are ignored; if none of them exist the
/// call fails with [`AnalysisError::NoValidTickers`].
pub fn descriptive_stats(
    data: &Table,
    tickers: &[String],
) -> Result<Vec<DescriptiveStats>, AnalysisError> {
    let valid_tickers = data.present_tickers(tickers);
    if valid_tickers.is_empty() {
        warn!(
            requested = tickers.len(),
            columns = data.width(),
            "None of the requested tickers are in the dataset"
        );
        return Err(AnalysisError::NoValidTickers {
            requested: tickers.len(),
        });
    }

    if valid_tickers.len() < tickers.len() {
        debug!(
            requested = tickers.len(),
            valid = valid_tickers.len(),
            "Ignoring tickers absent from the dataset"
        );
    }

    Ok(valid_tickers
        .into_iter()
        .filter_map(|ticker| {
            let values = data.column(&ticker)?;
            Some(describe(ticker, values))
        })
        .collect())
}

/// Statistics of one series; missing values are ignored.
pub fn describe(ticker: String, values: &[f64]) -> DescriptiveStats {
    let mut sorted = finite_values(values);
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = mean(&sorted);

    DescriptiveStats {
        ticker,
        count,
        mean,
        std: sample_std(&sorted),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q75: percentile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
        skewness: skewness(&sorted),
        kurtosis: kurtosis(&sorted),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with one degree of freedom removed
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Percentile `q` in `[0, 1]` of ascending `sorted`, interpolating linearly between ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Adjusted Fisher-Pearson sample skewness (G1)
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let (m2, m3, _) = central_sums(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    (n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5))
}

/// Bias-corrected sample excess kurtosis (G2)
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let (m2, _, m4) = central_sums(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    let numerator = n * (n + 1.0) * (n - 1.0) * m4;
    let denominator = (n - 2.0) * (n - 3.0) * m2 * m2;
    let adjustment = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    numerator / denominator - adjustment
}

// Sums of squared, cubed and fourth-power deviations from the mean
fn central_sums(values: &[f64]) -> (f64, f64, f64) {
    let m = mean(values);
    values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
        let d = v - m;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(columns: Vec<(&str, Vec<f64>)>) -> Table {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let index = (0..rows)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        Table::new(
            index,
            columns
                .into_iter()
                .map(|(name, values)| (name.to_string(), values))
                .collect(),
        )
        .unwrap()
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_overlap_is_invalid_input() {
        let data = table(vec![("AAPL", vec![1.0, 2.0, 3.0])]);
        let result = descriptive_stats(&data, &tickers(&["TSLA", "NVDA"]));
        assert_eq!(result, Err(AnalysisError::NoValidTickers { requested: 2 }));

        let result = descriptive_stats(&data, &[]);
        assert!(matches!(result, Err(AnalysisError::NoValidTickers { .. })));
    }

    #[test]
    fn test_one_row_per_present_ticker() {
        let data = table(vec![
            ("AAPL", vec![0.01, -0.02, 0.03, 0.005, -0.01]),
            ("MSFT", vec![0.02, 0.01, -0.005, 0.0, 0.015]),
        ]);
        let stats = descriptive_stats(&data, &tickers(&["MSFT", "TSLA", "AAPL"])).unwrap();

        let names: Vec<&str> = stats.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(names, vec!["MSFT", "AAPL"]);
        for row in &stats {
            assert_eq!(row.count, 5);
            assert!(row.min <= row.mean && row.mean <= row.max);
            assert!(row.q25 <= row.median && row.median <= row.q75);
        }
    }

    #[test]
    fn test_known_values() {
        let data = table(vec![("X", vec![1.0, 2.0, 3.0, 4.0, f64::NAN, 10.0])]);
        let stats = descriptive_stats(&data, &tickers(&["X"])).unwrap();
        let x = &stats[0];

        assert_eq!(x.count, 5);
        assert!((x.mean - 4.0).abs() < 1e-12);
        assert!((x.std - 12.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(x.min, 1.0);
        assert_eq!(x.q25, 2.0);
        assert_eq!(x.median, 3.0);
        assert_eq!(x.q75, 4.0);
        assert_eq!(x.max, 10.0);
        // m2 = 50, m3 = 180, m4 = 1394 around the mean 4
        let expected_skew = 5.0 * 2.0 / 3.0 * (180.0 / 50.0_f64.powf(1.5));
        assert!((x.skewness - expected_skew).abs() < 1e-9);
        let expected_kurt = 5.0 * 6.0 * 4.0 * 1394.0 / (3.0 * 2.0 * 2500.0) - 3.0 * 16.0 / 6.0;
        assert!((x.kurtosis - expected_kurt).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_short_and_empty_columns() {
        let data = table(vec![
            ("SHORT", vec![1.0, 2.0, f64::NAN]),
            ("EMPTY", vec![f64::NAN, f64::NAN, f64::NAN]),
        ]);
        let stats = descriptive_stats(&data, &tickers(&["SHORT", "EMPTY"])).unwrap();

        assert_eq!(stats[0].count, 2);
        assert!(stats[0].skewness.is_nan());
        assert!(stats[0].kurtosis.is_nan());

        assert_eq!(stats[1].count, 0);
        assert!(stats[1].mean.is_nan());
        assert!(stats[1].min.is_nan());
    }

    #[test]
    fn test_constant_column_has_zero_moments() {
        let data = table(vec![("FLAT", vec![2.0; 6])]);
        let stats = descriptive_stats(&data, &tickers(&["FLAT"])).unwrap();
        assert_eq!(stats[0].std, 0.0);
        assert_eq!(stats[0].skewness, 0.0);
        assert_eq!(stats[0].kurtosis, 0.0);
    }
}
