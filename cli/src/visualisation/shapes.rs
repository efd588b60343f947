//! Geometry of the statistical charts, computed without a drawing backend.

use crate::analysis::descriptive::percentile;
use crate::models::finite_values;

/// Bins per histogram
pub const HISTOGRAM_BINS: usize = 10;

/// Whisker reach in interquartile ranges
pub const WHISKER_IQR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over the finite values; `None` when there are none.
///
/// The last bin is closed on the right. A constant series gets bins spread
/// over `value ± 0.5`.
pub fn histogram(values: &[f64], bins: usize) -> Option<Vec<HistogramBin>> {
    let values = finite_values(values);
    if values.is_empty() || bins == 0 {
        return None;
    }

    let (mut low, mut high) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in &values {
        let slot = (((value - low) / width) as usize).min(bins - 1);
        counts[slot] += 1;
    }

    Some(
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: low + i as f64 * width,
                end: if i + 1 == bins {
                    high
                } else {
                    low + (i + 1) as f64 * width
                },
                count,
            })
            .collect(),
    )
}

/// Box-and-whisker summary of one series
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = finite_values(values);
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile(&sorted, 0.25);
        let median = percentile(&sorted, 0.5);
        let q3 = percentile(&sorted, 0.75);
        let reach = WHISKER_IQR * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let inside = sorted.iter().filter(|v| **v >= low_fence && **v <= high_fence);
        let lower_whisker = inside.clone().next().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .filter(|v| **v < low_fence || **v > high_fence)
            .copied()
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }

    /// Lowest and highest point drawn
    pub fn extent(&self) -> (f64, f64) {
        self.outliers.iter().fold(
            (self.lower_whisker, self.upper_whisker),
            |(lo, hi), v| (lo.min(*v), hi.max(*v)),
        )
    }
}

/// Split a line into runs of finite points so gaps are not bridged.
pub fn finite_segments<I>(points: I) -> Vec<Vec<(f64, f64)>>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (x, y) in points {
        if y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Padded `(min, max)` of the finite values, `(0, 1)` when there are none.
pub fn value_range<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let (low, high) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !low.is_finite() {
        return (0.0, 1.0);
    }
    if low == high {
        let pad = if low == 0.0 { 1.0 } else { low.abs() * 0.1 };
        return (low - pad, high + pad);
    }
    let pad = (high - low) * 0.05;
    (low - pad, high + pad)
}
