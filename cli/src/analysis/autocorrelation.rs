//! Autocorrelation (ACF) and partial autocorrelation (PACF).

use crate::error::AnalysisError;
use statrs::distribution::{ContinuousCDF, Normal};

/// Lags drawn by the ACF/PACF chart
pub const ACF_LAGS: usize = 25;

/// Two-sided coverage of the confidence bands
pub const CONFIDENCE: f64 = 0.95;

/// Biased sample autocorrelation for lags `0..=nlags`; `acf[0]` is 1.
pub fn acf(series: &[f64], nlags: usize) -> Result<Vec<f64>, AnalysisError> {
    let n = series.len();
    if n == 0 {
        return Err(AnalysisError::EmptySeries);
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::MissingValues);
    }
    if nlags >= n {
        return Err(AnalysisError::InsufficientData {
            required: nlags + 1,
            found: n,
        });
    }

    let mean = series.iter().sum::<f64>() / n as f64;
    let deviations: Vec<f64> = series.iter().map(|v| v - mean).collect();
    let autocovariance = |lag: usize| -> f64 {
        deviations[lag..]
            .iter()
            .zip(&deviations)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64
    };

    let variance = autocovariance(0);
    if variance == 0.0 {
        return Err(AnalysisError::ZeroVariance);
    }

    Ok((0..=nlags)
        .map(|lag| {
            if lag == 0 {
                1.0
            } else {
                autocovariance(lag) / variance
            }
        })
        .collect())
}

/// Yule-Walker partial autocorrelation via Durbin-Levinson; `pacf[0]` is 1.
///
/// Needs `nlags <= n / 2`.
pub fn pacf(series: &[f64], nlags: usize) -> Result<Vec<f64>, AnalysisError> {
    let n = series.len();
    if n > 0 && nlags > n / 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2 * nlags,
            found: n,
        });
    }
    let rho = acf(series, nlags)?;

    let mut pacf = vec![0.0; nlags + 1];
    pacf[0] = 1.0;
    if nlags == 0 {
        return Ok(pacf);
    }

    // phi holds the AR(k-1) coefficients, phi[j] for j in 1..k
    let mut phi = vec![0.0; nlags + 1];
    phi[1] = rho[1];
    pacf[1] = rho[1];

    for k in 2..=nlags {
        let numerator = rho[k] - (1..k).map(|j| phi[j] * rho[k - j]).sum::<f64>();
        let denominator = 1.0 - (1..k).map(|j| phi[j] * rho[j]).sum::<f64>();
        if denominator.abs() < 1e-12 {
            return Err(AnalysisError::SingularRegression);
        }

        let reflection = numerator / denominator;
        let previous = phi.clone();
        for j in 1..k {
            phi[j] = previous[j] - reflection * previous[k - j];
        }
        phi[k] = reflection;
        pacf[k] = reflection;
    }

    Ok(pacf)
}

/// Half-widths of the 95% band around each ACF value, Bartlett's formula.
///
/// Lag 0 has width 0.
pub fn acf_confint(acf: &[f64], nobs: usize) -> Vec<f64> {
    let z = critical_z();
    let n = nobs as f64;
    let mut cumulative = 0.0;
    acf.iter()
        .enumerate()
        .map(|(lag, value)| {
            let width = match lag {
                0 => 0.0,
                _ => z * ((1.0 + 2.0 * cumulative) / n).sqrt(),
            };
            if lag > 0 {
                cumulative += value * value;
            }
            width
        })
        .collect()
}

/// Half-widths of the 95% band around each PACF value, `z / sqrt(n)`.
pub fn pacf_confint(nlags: usize, nobs: usize) -> Vec<f64> {
    let width = critical_z() / (nobs as f64).sqrt();
    (0..=nlags)
        .map(|lag| if lag == 0 { 0.0 } else { width })
        .collect()
}

fn critical_z() -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(0.5 + CONFIDENCE / 2.0),
        Err(_) => 1.959_963_984_540_054,
    }
}
