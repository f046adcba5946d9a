use crate::config::VolatilityConfig;
use crate::model::{VolatilityAssessment, VolatilityLabel};
use chrono::Duration;

pub struct VolatilityClassifier {
    config: VolatilityConfig,
}

impl VolatilityClassifier {
    pub fn new(config: VolatilityConfig) -> Self {
        Self { config }
    }

    /// Number of return periods per year for a series sampled every
    /// `sampling_period`. Without `adapt_to_sampling` this is the configured
    /// value as is.
    pub fn periods_per_year(&self, sampling_period: Duration) -> f64 {
        if !self.config.adapt_to_sampling {
            return self.config.periods_per_year;
        }

        let period_secs = sampling_period.num_seconds();
        if period_secs <= 0 {
            return self.config.periods_per_year;
        }

        let per_day = Duration::days(1).num_seconds() as f64 / period_secs as f64;
        self.config.periods_per_year * per_day
    }

    pub fn annualize_volatility(&self, std_return: f64, sampling_period: Duration) -> f64 {
        std_return * self.periods_per_year(sampling_period).sqrt()
    }

    /// `< low` is LOW, `[low, medium)` is MEDIUM, anything else HIGH.
    pub fn classify_volatility(&self, annual_vol: f64) -> VolatilityLabel {
        if annual_vol < self.config.low_threshold {
            VolatilityLabel::Low
        } else if annual_vol < self.config.medium_threshold {
            VolatilityLabel::Medium
        } else {
            VolatilityLabel::High
        }
    }

    pub fn assess(&self, std_return: f64, sampling_period: Duration) -> VolatilityAssessment {
        let annual_volatility = self.annualize_volatility(std_return, sampling_period);
        VolatilityAssessment {
            annual_volatility,
            label: self.classify_volatility(annual_volatility),
        }
    }
}
