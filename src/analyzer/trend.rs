use crate::config::TrendConfig;
use crate::model::{PriceSeries, Trend, TrendAssessment};
use std::collections::BTreeMap;

/// Dual moving average trend detector working on raw prices.
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Short and long MA lengths for a series of `length` points. The long
    /// window is always at least one longer than the short one.
    pub fn ma_windows(&self, length: usize) -> (usize, usize) {
        let scaled = |ratio: f64| (length as f64 * ratio).floor() as usize;

        let short_window = scaled(self.config.short_ma_ratio).max(2);
        let long_window = scaled(self.config.long_ma_ratio).max(short_window + 1);
        (short_window, long_window.min(length))
    }

    pub fn analyze(&self, prices: &[f64]) -> TrendAssessment {
        let length = prices.len();
        if length < self.config.min_points.max(3) {
            return TrendAssessment::neutral();
        }

        let (short_window, long_window) = self.ma_windows(length);
        let short_ma = tail_mean(prices, short_window);
        let long_ma = tail_mean(prices, long_window);

        if long_ma == 0.0 {
            return TrendAssessment::neutral();
        }

        let diff_ratio = (short_ma - long_ma) / long_ma;

        let trend = if diff_ratio.abs() < self.config.neutral_threshold {
            Trend::Neutral
        } else if diff_ratio > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        };

        TrendAssessment {
            trend,
            strength: diff_ratio.abs(),
        }
    }

    pub fn process_all(
        &self,
        windowed_data: &BTreeMap<u32, PriceSeries>,
    ) -> BTreeMap<u32, TrendAssessment> {
        windowed_data
            .iter()
            .map(|(&days, series)| (days, self.analyze(&series.prices())))
            .collect()
    }
}

fn tail_mean(prices: &[f64], n: usize) -> f64 {
    let tail = &prices[prices.len() - n..];
    tail.iter().sum::<f64>() / n as f64
}
