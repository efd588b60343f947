//! Classical additive seasonal decomposition: `y = trend + seasonal + residual`.

use crate::error::AnalysisError;

/// Cycle length used by the decomposition chart
pub const DECOMPOSITION_PERIOD: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Centred moving average, NaN where the filter does not fit
    pub trend: Vec<f64>,
    /// Per-phase means, zero on average over one cycle
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub period: usize,
}

/// Split `series` into trend, seasonal and residual components.
///
/// The series must be free of missing values and hold at least two full cycles.
pub fn seasonal_decompose(series: &[f64], period: usize) -> Result<Decomposition, AnalysisError> {
    if period < 2 {
        return Err(AnalysisError::InvalidPeriod { period });
    }
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::MissingValues);
    }
    let n = series.len();
    if n < 2 * period {
        return Err(AnalysisError::InsufficientData {
            required: 2 * period,
            found: n,
        });
    }

    let trend = centred_moving_average(series, period);

    let detrended: Vec<f64> = series.iter().zip(&trend).map(|(y, t)| y - t).collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let (sum, count) = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect();
    let centre = phase_means.iter().sum::<f64>() / period as f64;
    phase_means.iter_mut().for_each(|m| *m -= centre);

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
    let residual = detrended.iter().zip(&seasonal).map(|(d, s)| d - s).collect();

    Ok(Decomposition {
        trend,
        seasonal,
        residual,
        period,
    })
}

// Even periods use the 2xMA filter [0.5, 1, ..., 1, 0.5] / period.
fn centred_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    let filter: Vec<f64> = if period % 2 == 0 {
        let mut weights = vec![1.0 / period as f64; period + 1];
        weights[0] = 0.5 / period as f64;
        weights[period] = 0.5 / period as f64;
        weights
    } else {
        vec![1.0 / period as f64; period]
    };

    let half = filter.len() / 2;
    let n = series.len();
    let mut trend = vec![f64::NAN; n];
    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        *slot = filter
            .iter()
            .zip(&series[i - half..])
            .map(|(w, y)| w * y)
            .sum();
    }
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn cycle(i: usize, period: usize) -> f64 {
        (2.0 * PI * i as f64 / period as f64).sin()
    }

    #[test]
    fn test_recovers_periodic_component() {
        let period = DECOMPOSITION_PERIOD;
        let series: Vec<f64> = (0..150)
            .map(|i| 10.0 + 0.5 * i as f64 + 3.0 * cycle(i, period))
            .collect();

        let result = seasonal_decompose(&series, period).unwrap();
        assert_eq!(result.period, period);
        assert_eq!(result.trend.len(), 150);

        for i in 0..150 {
            assert!((result.seasonal[i] - 3.0 * cycle(i, period)).abs() < 1e-9);
        }
        for i in 15..135 {
            assert!((result.trend[i] - (10.0 + 0.5 * i as f64)).abs() < 1e-9);
            assert!(result.residual[i].abs() < 1e-9);
        }
    }

    #[test]
    fn test_trend_edges_are_missing() {
        let series: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let result = seasonal_decompose(&series, 30).unwrap();

        assert!(result.trend[..15].iter().all(|v| v.is_nan()));
        assert!(result.trend[45..].iter().all(|v| v.is_nan()));
        assert!(result.trend[15..45].iter().all(|v| v.is_finite()));
        assert!(result.residual[0].is_nan());
        // seasonal is defined everywhere and centred
        assert!(result.seasonal.iter().all(|v| v.is_finite()));
        let mean: f64 = result.seasonal[..30].iter().sum::<f64>() / 30.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_odd_period_filter() {
        let series: Vec<f64> = (0..14).map(|i| (i % 7) as f64 + i as f64).collect();
        let result = seasonal_decompose(&series, 7).unwrap();
        assert!(result.trend[..3].iter().all(|v| v.is_nan()));
        assert!((result.trend[3] - 6.0).abs() < 1e-12);
        assert!(result.trend[11].is_nan());
    }

    #[test]
    fn test_rejects_unusable_input() {
        let short: Vec<f64> = (0..59).map(|i| i as f64).collect();
        assert_eq!(
            seasonal_decompose(&short, 30),
            Err(AnalysisError::InsufficientData {
                required: 60,
                found: 59
            })
        );
        assert_eq!(seasonal_decompose(&[], 30), Err(AnalysisError::EmptySeries));
        assert_eq!(
            seasonal_decompose(&[1.0, f64::NAN, 2.0, 3.0], 2),
            Err(AnalysisError::MissingValues)
        );
        assert_eq!(
            seasonal_decompose(&[1.0, 2.0], 1),
            Err(AnalysisError::InvalidPeriod { period: 1 })
        );
    }
}
