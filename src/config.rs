use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tickerscope::models::PriceField;
use tickerscope::services::DEFAULT_LOOKBACK_DAYS;

const DEFAULT_PRICE_FIELD: &str = "Adj Close";
const DEFAULT_OUTPUT_DIR: &str = "report";
const DEFAULT_WINDOW: usize = 20;

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub tickers: Vec<String>,
    pub lookback_days: Option<u32>,
    pub price_field: Option<String>,
    pub output_dir: Option<String>,
    pub ma_window: Option<usize>,
    pub ema_span: Option<usize>,
    pub environment: Option<String>,
}

// Holds the settings of one report run
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    pub tickers: Vec<String>,
    pub lookback_days: u32,
    pub price_field: PriceField,
    pub output_dir: PathBuf,
    pub ma_window: usize,
    pub ema_span: usize,
    pub environment: String,
}

impl ReportConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Check for CONFIG_FILE environment variable first
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;

        let yaml_config: ConfigYaml =
            serde_yaml::from_str(&yaml_content).context("Failed to parse YAML config")?;

        Self::from_yaml_config(yaml_config)
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tickers = var("TICKERS")
            .context("TICKERS must be set")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let parsed = |key: &str| -> anyhow::Result<Option<usize>> {
            var(key)
                .map(|raw| raw.trim().parse().with_context(|| format!("{} must be a number, got {:?}", key, raw)))
                .transpose()
        };

        Self::from_yaml_config(ConfigYaml {
            tickers,
            lookback_days: parsed("LOOKBACK_DAYS")?
                .map(u32::try_from)
                .transpose()
                .context("LOOKBACK_DAYS is too large")?,
            price_field: var("PRICE_FIELD"),
            output_dir: var("OUTPUT_DIR"),
            ma_window: parsed("MA_WINDOW")?,
            ema_span: parsed("EMA_SPAN")?,
            environment: var("ENVIRONMENT"),
        })
    }

    fn from_yaml_config(yaml_config: ConfigYaml) -> anyhow::Result<Self> {
        let price_field: PriceField = yaml_config
            .price_field
            .as_deref()
            .unwrap_or(DEFAULT_PRICE_FIELD)
            .parse()
            .map_err(anyhow::Error::msg)?;

        let config = Self {
            tickers: yaml_config.tickers,
            lookback_days: yaml_config.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
            price_field,
            output_dir: PathBuf::from(
                yaml_config
                    .output_dir
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            ma_window: yaml_config.ma_window.unwrap_or(DEFAULT_WINDOW),
            ema_span: yaml_config.ema_span.unwrap_or(DEFAULT_WINDOW),
            environment: yaml_config
                .environment
                .unwrap_or_else(|| "development".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.tickers.is_empty() {
            bail!("at least one ticker is required");
        }
        if self.lookback_days == 0 {
            bail!("lookback_days must be positive");
        }
        if self.ma_window == 0 || self.ema_span == 0 {
            bail!("ma_window and ema_span must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = ReportConfig::from_vars(vars(&[("TICKERS", "AAPL, MSFT,,")])).unwrap();
        assert_eq!(config.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.lookback_days, 200);
        assert_eq!(config.price_field, PriceField::AdjClose);
        assert_eq!(config.output_dir, PathBuf::from("report"));
        assert_eq!(config.ma_window, 20);
        assert_eq!(config.ema_span, 20);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_env_overrides_and_errors() {
        let config = ReportConfig::from_vars(vars(&[
            ("TICKERS", "NVDA"),
            ("LOOKBACK_DAYS", "365"),
            ("PRICE_FIELD", "close"),
            ("MA_WINDOW", "50"),
        ]))
        .unwrap();
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.price_field, PriceField::Close);
        assert_eq!(config.ma_window, 50);

        assert!(ReportConfig::from_vars(vars(&[])).is_err());
        assert!(ReportConfig::from_vars(vars(&[("TICKERS", " , ")])).is_err());
        assert!(ReportConfig::from_vars(vars(&[("TICKERS", "A"), ("MA_WINDOW", "abc")])).is_err());
        assert!(ReportConfig::from_vars(vars(&[("TICKERS", "A"), ("LOOKBACK_DAYS", "0")])).is_err());
        assert!(ReportConfig::from_vars(vars(&[("TICKERS", "A"), ("PRICE_FIELD", "vwap")])).is_err());
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "tickers: [AAPL, MSFT]\nlookback_days: 90\nprice_field: Volume\noutput_dir: out/run1\nenvironment: production"
        )
        .unwrap();

        let config = ReportConfig::from_yaml(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.price_field, PriceField::Volume);
        assert_eq!(config.output_dir, PathBuf::from("out/run1"));
        assert_eq!(config.ema_span, 20);
        assert_eq!(config.environment, "production");

        assert!(ReportConfig::from_yaml("/nonexistent/config.yaml").is_err());
    }
}
