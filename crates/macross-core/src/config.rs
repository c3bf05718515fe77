use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::window::{SearchGrid, StepRange, WindowPair};

/// Top-level run config, parsed from one or more layered TOML files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
}

impl BacktestConfig {
    /// Load config from a TOML file path.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load and merge multiple TOML files (later files override earlier).
    pub fn from_toml_files(paths: &[&Path]) -> Result<Self, ConfigError> {
        let (first, rest) = paths.split_first().ok_or(ConfigError::NoFiles)?;

        let mut base: toml::Value = toml::from_str(&std::fs::read_to_string(first)?)?;
        for path in rest {
            let overlay: toml::Value = toml::from_str(&std::fs::read_to_string(path)?)?;
            merge_toml(&mut base, overlay);
        }

        Ok(base.try_into()?)
    }
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) = (base, overlay) {
        for (key, value) in overlay_table {
            if let Some(base_value) = base_table.get_mut(&key) {
                if base_value.is_table() && value.is_table() {
                    merge_toml(base_value, value);
                    continue;
                }
            }
            base_table.insert(key, value);
        }
    }
}

/// Where the price history comes from and which slice of it to use.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub prices: Option<PathBuf>,
    #[serde(default = "default_ticker")]
    pub ticker: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prices: None,
            ticker: default_ticker(),
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_50")]
    pub short_window: usize,
    #[serde(default = "default_200")]
    pub long_window: usize,
}

impl StrategyConfig {
    pub fn window_pair(&self) -> WindowPair {
        WindowPair::new(self.short_window, self.long_window)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_10")]
    pub short_start: usize,
    #[serde(default = "default_60")]
    pub short_end: usize,
    #[serde(default = "default_5")]
    pub short_step: usize,
    #[serde(default = "default_100")]
    pub long_start: usize,
    #[serde(default = "default_250")]
    pub long_end: usize,
    #[serde(default = "default_10")]
    pub long_step: usize,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl OptimizerConfig {
    pub fn grid(&self) -> SearchGrid {
        SearchGrid::new(
            StepRange::new(self.short_start, self.short_end, self.short_step),
            StepRange::new(self.long_start, self.long_end, self.long_step),
        )
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            short_start: 10,
            short_end: 60,
            short_step: 5,
            long_start: 100,
            long_end: 250,
            long_step: 10,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentConfig {
    #[serde(default)]
    pub headlines: Option<PathBuf>,
}

// Default value helpers
fn default_true() -> bool { true }
fn default_5() -> usize { 5 }
fn default_10() -> usize { 10 }
fn default_50() -> usize { 50 }
fn default_60() -> usize { 60 }
fn default_100() -> usize { 100 }
fn default_200() -> usize { 200 }
fn default_250() -> usize { 250 }
fn default_ticker() -> String { "UNKNOWN".into() }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no config files provided")]
    NoFiles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[data]
prices = "data/NVDA.csv"
ticker = "NVDA"
start = "2020-01-01"
end = "2024-01-01"

[strategy]
short_window = 20
long_window = 120

[optimizer]
short_step = 10
parallel = false

[sentiment]
headlines = "NVDA stock.csv"
"#;

        let config = BacktestConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.data.ticker, "NVDA");
        assert_eq!(config.data.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(config.strategy.window_pair(), WindowPair::new(20, 120));
        assert_eq!(config.optimizer.short_step, 10);
        assert_eq!(config.optimizer.long_end, 250);
        assert!(!config.optimizer.parallel);
        assert_eq!(
            config.sentiment.headlines.as_deref(),
            Some(Path::new("NVDA stock.csv"))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BacktestConfig::from_toml_str("").unwrap();
        assert_eq!(config.data.ticker, "UNKNOWN");
        assert_eq!(config.strategy.window_pair(), WindowPair::new(50, 200));
        assert_eq!(config.optimizer.grid(), SearchGrid::default());
        assert!(config.optimizer.parallel);
    }

    #[test]
    fn test_merge_overlay_overrides_nested_keys() {
        let mut base: toml::Value = toml::from_str(
            "[strategy]\nshort_window = 10\nlong_window = 100\n[data]\nticker = \"AAPL\"\n",
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[strategy]\nlong_window = 150\n").unwrap();
        merge_toml(&mut base, overlay);

        let config: BacktestConfig = base.try_into().unwrap();
        assert_eq!(config.strategy.window_pair(), WindowPair::new(10, 150));
        assert_eq!(config.data.ticker, "AAPL");
    }

    #[test]
    fn test_bad_type_is_parse_error() {
        let err = BacktestConfig::from_toml_str("[strategy]\nshort_window = \"ten\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_no_files() {
        assert!(matches!(
            BacktestConfig::from_toml_files(&[]),
            Err(ConfigError::NoFiles)
        ));
    }
}
