use crate::error::AnalysisError;
use serde::Serialize;

/// Summary statistics of one ticker column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub ticker: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// MacKinnon critical values of the ADF statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

/// Outcome of an Augmented Dickey-Fuller test on one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
    pub stationary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationarityRow {
    pub ticker: String,
    pub test: Result<AdfResult, AnalysisError>,
}

impl StationarityRow {
    pub fn statistic(&self) -> Option<f64> {
        self.test.as_ref().ok().map(|adf| adf.statistic)
    }

    pub fn p_value(&self) -> Option<f64> {
        self.test.as_ref().ok().map(|adf| adf.p_value)
    }

    /// "Yes", "No", or "Failed" when the series could not be tested
    pub fn label(&self) -> &'static str {
        match &self.test {
            Ok(adf) if adf.stationary => "Yes",
            Ok(_) => "No",
            Err(_) => "Failed",
        }
    }

    pub fn summary(&self) -> StationaritySummary {
        let adf = self.test.as_ref().ok();
        StationaritySummary {
            ticker: self.ticker.clone(),
            adf_statistic: adf.map(|a| a.statistic),
            p_value: adf.map(|a| a.p_value),
            stationary: self.label(),
            used_lag: adf.map(|a| a.used_lag),
            nobs: adf.map(|a| a.nobs),
            error: self.test.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// Flat, serializable view of a [`StationarityRow`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationaritySummary {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "ADF Statistic")]
    pub adf_statistic: Option<f64>,
    #[serde(rename = "p-value")]
    pub p_value: Option<f64>,
    #[serde(rename = "Stationary")]
    pub stationary: &'static str,
    pub used_lag: Option<usize>,
    pub nobs: Option<usize>,
    pub error: Option<String>,
}
