//! Augmented Dickey-Fuller unit-root test.
//!
//! H0: the series has a unit root (non-stationary).
//! H1: the series is stationary.
//!
//! The regression is `dy[t] = a + b*y[t-1] + sum(g[i]*dy[t-i]) + e[t]` with the
//! lag count chosen by AIC; the statistic is the t-value of `b`.

use crate::error::AnalysisError;
use crate::models::{finite_values, AdfResult, CriticalValues, StationarityRow, Table};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

/// p-values below this classify a series as stationary
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Smallest series the test accepts
pub const MIN_OBSERVATIONS: usize = 4;

// MacKinnon (1994) response surface for one series with a constant term
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010) critical value polynomials in 1/nobs
const CRIT_1: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Run the ADF test on every column of `data`.
///
/// Missing values are dropped per column. A column that cannot be tested is
/// reported as a failure in its own row; the other columns are unaffected.
pub fn ts_stationarity(data: &Table) -> Vec<StationarityRow> {
    data.iter_columns()
        .map(|(ticker, values)| {
            let series = finite_values(values);
            let test = adfuller(&series);
            match &test {
                Ok(adf) => debug!(
                    ticker,
                    statistic = adf.statistic,
                    p_value = adf.p_value,
                    used_lag = adf.used_lag,
                    "ADF test completed"
                ),
                Err(error) => warn!(ticker, %error, "ADF test failed"),
            }
            StationarityRow {
                ticker: ticker.to_string(),
                test,
            }
        })
        .collect()
}

/// ADF test with a constant term and AIC lag selection.
pub fn adfuller(series: &[f64]) -> Result<AdfResult, AnalysisError> {
    let n = series.len();
    if n == 0 {
        return Err(AnalysisError::EmptySeries);
    }
    if n < MIN_OBSERVATIONS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_OBSERVATIONS,
            found: n,
        });
    }
    if series.iter().all(|v| *v == series[0]) {
        return Err(AnalysisError::ZeroVariance);
    }

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let max_lag = default_max_lag(n);

    // Every candidate is fitted on the sample of the longest lag so AICs compare.
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (x, y) = design(series, &diff, max_lag, lag);
        let aic = ols(&x, &y)?.aic();
        if best.map_or(true, |(best_aic, _)| aic < best_aic) {
            best = Some((aic, lag));
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let (x, y) = design(series, &diff, used_lag, used_lag);
    let fit = ols(&x, &y)?;
    let statistic = fit.t_value(1);
    if !statistic.is_finite() {
        return Err(AnalysisError::SingularRegression);
    }

    let nobs = y.len();
    let p_value = mackinnon_p_value(statistic);

    Ok(AdfResult {
        statistic,
        p_value,
        used_lag,
        nobs,
        critical_values: critical_values(nobs),
        stationary: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// Schwert's rule `ceil(12 * (n/100)^(1/4))`, capped so every regression keeps
/// positive degrees of freedom.
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Approximate p-value of an ADF statistic (MacKinnon 1994).
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };

    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => f64::NAN,
    }
}

/// 1%, 5% and 10% critical values for a regression with `nobs` observations (MacKinnon 2010).
pub fn critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        one_percent: polyval(&CRIT_1, inv),
        five_percent: polyval(&CRIT_5, inv),
        ten_percent: polyval(&CRIT_10, inv),
    }
}

// coefficients[0] + coefficients[1] * x + ...
fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Regression rows for `dy[i]`, i from `start`, regressors `[1, y[i], dy[i-1], ..., dy[i-lag]]`.
fn design(series: &[f64], diff: &[f64], start: usize, lag: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diff.len() - start;
    let cols = 2 + lag;
    let mut x = DMatrix::zeros(rows, cols);
    let mut y = DVector::zeros(rows);

    for (r, i) in (start..diff.len()).enumerate() {
        y[r] = diff[i];
        x[(r, 0)] = 1.0;
        x[(r, 1)] = series[i];
        for j in 1..=lag {
            x[(r, 1 + j)] = diff[i - j];
        }
    }

    (x, y)
}

struct OlsFit {
    beta: DVector<f64>,
    xtx_inv: DMatrix<f64>,
    ssr: f64,
    nobs: usize,
    k: usize,
}

impl OlsFit {
    fn t_value(&self, j: usize) -> f64 {
        let sigma2 = self.ssr / (self.nobs - self.k) as f64;
        self.beta[j] / (sigma2 * self.xtx_inv[(j, j)]).sqrt()
    }

    fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.k as f64
    }
}

fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, AnalysisError> {
    let (nobs, k) = x.shape();
    if nobs <= k {
        return Err(AnalysisError::InsufficientData {
            required: k + 1,
            found: nobs,
        });
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x)
        .try_inverse()
        .ok_or(AnalysisError::SingularRegression)?;
    let beta = &xtx_inv * (&xt * y);
    let residuals = y - x * &beta;

    Ok(OlsFit {
        beta,
        xtx_inv,
        ssr: residuals.norm_squared(),
        nobs,
        k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
    }

    fn random_walk(n: usize, seed: u64, drift: f64) -> Vec<f64> {
        let mut level = 100.0;
        white_noise(n, seed)
            .into_iter()
            .map(|step| {
                level += drift + step;
                level
            })
            .collect()
    }

    fn table(columns: Vec<(&str, Vec<f64>)>) -> Table {
        let rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
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

    #[test]
    fn test_white_noise_is_stationary() {
        let result = adfuller(&white_noise(300, 7)).unwrap();
        assert!(result.p_value < SIGNIFICANCE_LEVEL);
        assert!(result.stationary);
    }

    #[test]
    fn test_random_walks_are_not_stationary() {
        // a unit root is still rejected at about the 5% level, so judge many walks
        let results: Vec<AdfResult> = (0..40)
            .map(|seed| adfuller(&random_walk(500, 1000 + seed, 0.0)).unwrap())
            .collect();
        let not_stationary = results.iter().filter(|r| !r.stationary).count();
        assert!(not_stationary >= 32, "only {} of 40 walks kept their unit root", not_stationary);

        for result in &results {
            assert_eq!(result.stationary, result.p_value < SIGNIFICANCE_LEVEL);
        }
        let mean_p = results.iter().map(|r| r.p_value).sum::<f64>() / results.len() as f64;
        assert!(mean_p > 0.2);
    }

    #[test]
    fn test_p_value_surface() {
        assert!((mackinnon_p_value(-2.86) - 0.05).abs() < 0.005);
        assert!(mackinnon_p_value(0.0) > 0.9);
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        // both branches meet near the switch point
        let below = mackinnon_p_value(TAU_STAR - 1e-9);
        let above = mackinnon_p_value(TAU_STAR + 1e-9);
        assert!((below - above).abs() < 0.01);
    }

    #[test]
    fn test_critical_values_approach_asymptotic() {
        let cv = critical_values(100_000);
        assert!((cv.one_percent + 3.43035).abs() < 1e-3);
        assert!((cv.five_percent + 2.86154).abs() < 1e-3);
        assert!((cv.ten_percent + 2.56677).abs() < 1e-3);

        let small = critical_values(50);
        assert!(small.one_percent < small.five_percent);
        assert!(small.five_percent < small.ten_percent);
    }

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(100), 12);
        assert_eq!(default_max_lag(4), 0);
        assert_eq!(default_max_lag(10), 3);
    }

    #[test]
    fn test_degenerate_series_are_failures() {
        assert_eq!(adfuller(&[]), Err(AnalysisError::EmptySeries));
        assert_eq!(
            adfuller(&[1.0, 2.0, 1.5]),
            Err(AnalysisError::InsufficientData {
                required: MIN_OBSERVATIONS,
                found: 3
            })
        );
        assert_eq!(adfuller(&[5.0; 50]), Err(AnalysisError::ZeroVariance));
    }

    #[test]
    fn test_one_row_per_column_in_order() {
        let data = table(vec![
            ("NOISE", white_noise(250, 3)),
            ("WALK", random_walk(250, 5, 0.2)),
            ("EMPTY", vec![f64::NAN; 250]),
        ]);

        let rows = ts_stationarity(&data);
        let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["NOISE", "WALK", "EMPTY"]);

        assert_eq!(rows[0].label(), "Yes");
        assert_eq!(rows[1].label(), "No");
        assert_eq!(rows[2].label(), "Failed");
        assert_eq!(rows[2].test, Err(AnalysisError::EmptySeries));
        assert!(rows[2].statistic().is_none());
    }

    #[test]
    fn test_missing_values_are_dropped_before_testing() {
        let mut noise = white_noise(200, 21);
        for i in (0..200).step_by(10) {
            noise[i] = f64::NAN;
        }
        let rows = ts_stationarity(&table(vec![("GAPS", noise)]));
        let adf = rows[0].test.as_ref().unwrap();
        assert_eq!(adf.nobs + adf.used_lag + 1, 180);
    }
}
