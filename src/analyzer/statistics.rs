use crate::model::{PriceSeries, WindowStatistics};
use std::collections::BTreeMap;

/// Mean and sample standard deviation of a return series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnMoments {
    pub mean: f64,
    pub std: f64,
}

impl ReturnMoments {
    pub fn zero() -> Self {
        Self { mean: 0.0, std: 0.0 }
    }
}

pub struct StatisticsCalculator;

impl StatisticsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Simple returns `(p[i] - p[i-1]) / p[i-1]`, one fewer than the input.
    /// Empty and single-point input gives an empty series.
    pub fn compute_returns(prices: &[f64]) -> Vec<f64> {
        prices
            .windows(2)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    /// Arithmetic mean and sample (n-1) standard deviation. Fewer than two
    /// returns cannot say anything about dispersion, so both are zero.
    pub fn calculate_statistics(returns: &[f64]) -> ReturnMoments {
        if returns.len() < 2 {
            return ReturnMoments::zero();
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        ReturnMoments {
            mean,
            std: variance.sqrt(),
        }
    }

    /// Statistics for one window. Open, close and change come from the raw
    /// prices, whatever the number of returns.
    pub fn window_statistics(&self, series: &PriceSeries) -> Option<WindowStatistics> {
        let open_price = series.first()?.price;
        let close_price = series.last()?.price;

        let returns = Self::compute_returns(&series.prices());
        let moments = Self::calculate_statistics(&returns);

        let change_pct = if open_price != 0.0 {
            (close_price - open_price) / open_price
        } else {
            0.0
        };

        Some(WindowStatistics {
            mean_return: moments.mean,
            std_return: moments.std,
            open_price,
            close_price,
            change_pct,
        })
    }

    pub fn process_windows(
        &self,
        windows: &BTreeMap<u32, PriceSeries>,
    ) -> BTreeMap<u32, WindowStatistics> {
        windows
            .iter()
            .filter_map(|(&days, series)| Some((days, self.window_statistics(series)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::{Duration, TimeZone, Utc};

    fn series(prices: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + Duration::days(i as i64), p))
            .collect();
        PriceSeries::new(points, Duration::days(1))
    }

    #[test]
    fn returns_have_n_minus_one_values() {
        let prices = [100.0, 110.0, 99.0, 99.0, 120.0];
        let returns = StatisticsCalculator::compute_returns(&prices);

        assert_eq!(returns.len(), prices.len() - 1);
        for (i, r) in returns.iter().enumerate() {
            let expected = prices[i + 1] / prices[i] - 1.0;
            assert!((r - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn returns_of_short_input_are_empty() {
        assert!(StatisticsCalculator::compute_returns(&[]).is_empty());
        assert!(StatisticsCalculator::compute_returns(&[42.0]).is_empty());
    }

    #[test]
    fn sample_standard_deviation() {
        let m = StatisticsCalculator::calculate_statistics(&[0.01, 0.02, -0.01]);
        assert!((m.mean - 0.006_667).abs() < 1e-6);
        assert!((m.std - 0.015_275).abs() < 1e-6);
    }

    #[test]
    fn fewer_than_two_returns_is_degenerate() {
        assert_eq!(StatisticsCalculator::calculate_statistics(&[]), ReturnMoments::zero());
        assert_eq!(StatisticsCalculator::calculate_statistics(&[0.05]), ReturnMoments::zero());
    }

    #[test]
    fn change_uses_raw_prices_even_when_degenerate() {
        let stats = StatisticsCalculator::new()
            .window_statistics(&series(&[100.0, 105.0]))
            .unwrap();

        assert_eq!(stats.mean_return, 0.0);
        assert_eq!(stats.std_return, 0.0);
        assert_eq!(stats.open_price, 100.0);
        assert_eq!(stats.close_price, 105.0);
        assert!((stats.change_pct - 0.05).abs() < 1e-12);
    }

    #[test]
    fn empty_window_has_no_statistics() {
        assert!(StatisticsCalculator::new().window_statistics(&series(&[])).is_none());
    }

    #[test]
    fn process_windows_keys_by_days() {
        let mut windows = BTreeMap::new();
        windows.insert(3, series(&[1.0, 2.0, 3.0]));
        windows.insert(1, series(&[]));

        let out = StatisticsCalculator::new().process_windows(&windows);
        assert_eq!(out.len(), 1);
        assert!((out[&3].change_pct - 2.0).abs() < 1e-12);
    }
}
