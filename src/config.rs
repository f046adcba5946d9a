use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub periods_per_year: f64,
    pub low_threshold: f64,
    pub medium_threshold: f64,
    /// Scale `periods_per_year` by the series' sampling period instead of
    /// assuming one return per day.
    pub adapt_to_sampling: bool,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 365.0,
            low_threshold: 0.40,
            medium_threshold: 0.80,
            adapt_to_sampling: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub short_ma_ratio: f64,
    pub long_ma_ratio: f64,
    pub neutral_threshold: f64,
    pub min_points: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            short_ma_ratio: 0.2,
            long_ma_ratio: 0.5,
            neutral_threshold: 0.002,
            min_points: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_title: String,
    pub log_level: String,
    pub windows: Vec<u32>,
    pub refresh_interval_seconds: u64,
    pub retry_interval_seconds: u64,
    pub fallback_delay_seconds: u64,
    pub request_timeout_seconds: u64,
    pub vs_currency: String,
    pub coingecko_url: String,
    pub coinbase_url: String,
    pub coinbase_granularity_seconds: u32,
    pub stooq_url: String,
    pub tech_symbol: String,
    pub display_utc_offset_hours: i32,
    pub volatility: VolatilityConfig,
    pub trend: TrendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_title: "BITCOIN MARKET ANALYZER".into(),
            log_level: "info".into(),
            windows: vec![30, 15, 10, 5, 3, 1],
            refresh_interval_seconds: 600,
            retry_interval_seconds: 30,
            fallback_delay_seconds: 2,
            request_timeout_seconds: 10,
            vs_currency: "usd".into(),
            coingecko_url: "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart".into(),
            coinbase_url: "https://api.exchange.coinbase.com/products/BTC-USD/candles".into(),
            coinbase_granularity_seconds: 3600,
            stooq_url: "https://stooq.com/q/d/l/?s=qqq.us&i=d".into(),
            tech_symbol: "QQQ".into(),
            display_utc_offset_hours: -3,
            volatility: VolatilityConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn max_window_days(&self) -> u32 {
        self.windows.iter().copied().max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.to_string()))
        };

        if self.windows.is_empty() {
            return invalid("at least one window is required");
        }
        if self.windows.contains(&0) {
            return invalid("window lengths must be positive");
        }
        if self.refresh_interval_seconds == 0 {
            return invalid("refresh_interval_seconds must be positive");
        }
        if self.retry_interval_seconds == 0 {
            return invalid("retry_interval_seconds must be positive");
        }
        if self.coinbase_granularity_seconds == 0 {
            return invalid("coinbase_granularity_seconds must be positive");
        }
        if !(-12..=14).contains(&self.display_utc_offset_hours) {
            return invalid("display_utc_offset_hours must be within -12..=14");
        }

        let vol = &self.volatility;
        if vol.periods_per_year <= 0.0 {
            return invalid("volatility.periods_per_year must be positive");
        }
        if vol.low_threshold <= 0.0 || vol.low_threshold >= vol.medium_threshold {
            return invalid("volatility thresholds must satisfy 0 < low < medium");
        }

        let trend = &self.trend;
        let in_unit = |r: f64| r > 0.0 && r <= 1.0;
        if !in_unit(trend.short_ma_ratio) || !in_unit(trend.long_ma_ratio) {
            return invalid("trend MA ratios must be within (0, 1]");
        }
        if trend.short_ma_ratio >= trend.long_ma_ratio {
            return invalid("trend.short_ma_ratio must be below trend.long_ma_ratio");
        }
        if trend.neutral_threshold < 0.0 {
            return invalid("trend.neutral_threshold must not be negative");
        }

        Ok(())
    }
}

/// Where the loaded config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Loads the config from `path`. A missing file yields the defaults; the
/// returned source lets the caller report that once logging is up.
pub fn load_config(path: &str) -> Result<(AppConfig, ConfigSource), ConfigError> {
    let (config, source) = match fs::read_to_string(Path::new(path)) {
        Ok(content) => (serde_json::from_str::<AppConfig>(&content)?, ConfigSource::File),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            (AppConfig::default(), ConfigSource::Defaults)
        }
        Err(e) => return Err(e.into()),
    };
    config.validate()?;
    Ok((config, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_window_days(), 30);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "windows": [7, 2], "trend": { "neutral_threshold": 0.01 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.windows, vec![7, 2]);
        assert_eq!(cfg.trend.neutral_threshold, 0.01);
        assert_eq!(cfg.trend.short_ma_ratio, 0.2);
        assert_eq!(cfg.volatility.periods_per_year, 365.0);
        assert_eq!(cfg.refresh_interval_seconds, 600);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut cfg = AppConfig::default();
        cfg.volatility.low_threshold = 0.9;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_window() {
        let mut cfg = AppConfig::default();
        cfg.windows.push(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_retry_interval() {
        let cfg = AppConfig {
            retry_interval_seconds: 0,
            ..AppConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (cfg, source) = load_config("definitely/not/here/config.json").unwrap();
        assert_eq!(cfg.windows, AppConfig::default().windows);
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn existing_file_is_reported_as_file() {
        let path = std::env::temp_dir()
            .join(format!("btc-pulse-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "retry_interval_seconds": 45 }"#).unwrap();

        let loaded = load_config(path.to_str().unwrap());
        let _ = fs::remove_file(&path);

        let (cfg, source) = loaded.unwrap();
        assert_eq!(cfg.retry_interval_seconds, 45);
        assert_eq!(source, ConfigSource::File);
    }
}
