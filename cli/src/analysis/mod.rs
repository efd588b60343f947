pub mod autocorrelation;
pub mod decomposition;
pub mod descriptive;
pub mod stationarity;

pub use autocorrelation::{acf, acf_confint, pacf, pacf_confint, ACF_LAGS};
pub use decomposition::{seasonal_decompose, Decomposition, DECOMPOSITION_PERIOD};
pub use descriptive::{describe, descriptive_stats};
pub use stationarity::{adfuller, ts_stationarity, SIGNIFICANCE_LEVEL};
