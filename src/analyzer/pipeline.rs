use crate::analyzer::probability::ProbabilityEstimator;
use crate::analyzer::statistics::StatisticsCalculator;
use crate::analyzer::trend::TrendAnalyzer;
use crate::analyzer::volatility::VolatilityClassifier;
use crate::analyzer::windows::split_by_time_windows;
use crate::config::AppConfig;
use crate::model::{PriceSeries, WindowReport};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Trait defining the interface for the per-cycle analytics.
pub trait Analyzer {
    /// Splits the full series into the configured windows and analyses each.
    fn analyze_series(
        &self,
        series: &PriceSeries,
        now: DateTime<Utc>,
    ) -> BTreeMap<u32, WindowReport>;

    /// Analyses already split windows.
    fn analyze_windows(
        &self,
        windows: &BTreeMap<u32, PriceSeries>,
    ) -> BTreeMap<u32, WindowReport>;
}

/// Runs statistics, probability, volatility and trend for every window and
/// merges them into one report per window.
pub struct AnalyzerImpl {
    windows: Vec<u32>,
    statistics: StatisticsCalculator,
    probability: ProbabilityEstimator,
    volatility: VolatilityClassifier,
    trend: TrendAnalyzer,
}

impl AnalyzerImpl {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            windows: config.windows.clone(),
            statistics: StatisticsCalculator::new(),
            probability: ProbabilityEstimator::new(),
            volatility: VolatilityClassifier::new(config.volatility.clone()),
            trend: TrendAnalyzer::new(config.trend.clone()),
        }
    }
}

impl Analyzer for AnalyzerImpl {
    fn analyze_series(
        &self,
        series: &PriceSeries,
        now: DateTime<Utc>,
    ) -> BTreeMap<u32, WindowReport> {
        let windowed = split_by_time_windows(series, &self.windows, now);
        if windowed.len() < self.windows.len() {
            debug!(
                "{} of {} windows kept after split",
                windowed.len(),
                self.windows.len()
            );
        }
        self.analyze_windows(&windowed)
    }

    fn analyze_windows(
        &self,
        windows: &BTreeMap<u32, PriceSeries>,
    ) -> BTreeMap<u32, WindowReport> {
        let stats_by_window = self.statistics.process_windows(windows);
        let probabilities = self.probability.process_all(&stats_by_window);
        let trends = self.trend.process_all(windows);

        let mut reports = BTreeMap::new();
        for (&days, series) in windows {
            let (Some(statistics), Some(probability), Some(trend)) = (
                stats_by_window.get(&days),
                probabilities.get(&days),
                trends.get(&days),
            ) else {
                warn!("Skipping {}d window: no statistics", days);
                continue;
            };

            let volatility = self
                .volatility
                .assess(statistics.std_return, series.sampling_period());

            debug!(
                "{}d: change {:+.4} mean {:.6} std {:.6} p_up {:.3} vol {:.3} ({}) trend {} ({:.5})",
                days,
                statistics.change_pct,
                statistics.mean_return,
                statistics.std_return,
                probability.p_up,
                volatility.annual_volatility,
                volatility.label,
                trend.trend,
                trend.strength
            );

            reports.insert(
                days,
                WindowReport {
                    days,
                    statistics: *statistics,
                    probability: *probability,
                    volatility,
                    trend: *trend,
                },
            );
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, Trend, VolatilityLabel};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    /// Hourly series over the last `hours` hours, rising 0.1% an hour with
    /// a small wobble.
    fn hourly_series(hours: i64) -> PriceSeries {
        let points = (0..=hours)
            .map(|h| {
                let wobble = if h % 2 == 0 { 1.0005 } else { 0.9995 };
                let price = 30_000.0 * 1.001_f64.powi(h as i32) * wobble;
                PricePoint::new(now() - Duration::hours(hours - h), price)
            })
            .collect();
        PriceSeries::new(points, Duration::hours(1))
    }

    #[test]
    fn builds_one_report_per_window() {
        let analyzer = AnalyzerImpl::new(&AppConfig::default());
        let reports = analyzer.analyze_series(&hourly_series(30 * 24), now());

        assert_eq!(
            reports.keys().copied().collect::<Vec<_>>(),
            vec![1, 3, 5, 10, 15, 30]
        );
        for (days, report) in &reports {
            assert_eq!(report.days, *days);
            assert_eq!(report.trend.trend, Trend::Up);
            assert!(report.probability.p_up > report.probability.p_down);
            assert!((report.probability.p_up + report.probability.p_down - 1.0).abs() < 1e-12);
            assert!(report.statistics.change_pct > 0.0);
        }
    }

    #[test]
    fn short_history_makes_long_windows_identical() {
        let analyzer = AnalyzerImpl::new(&AppConfig::default());
        // 4 days of history: 5d window still covers all of it
        let reports = analyzer.analyze_series(&hourly_series(4 * 24), now());

        assert!(reports.contains_key(&1));
        assert!(reports.contains_key(&30));
        assert_eq!(reports[&5], WindowReport { days: 5, ..reports[&30] });
    }

    #[test]
    fn degenerate_window_gets_fallbacks() {
        let analyzer = AnalyzerImpl::new(&AppConfig::default());
        let mut windows = BTreeMap::new();
        windows.insert(
            1,
            PriceSeries::new(
                vec![
                    PricePoint::new(now() - Duration::hours(1), 100.0),
                    PricePoint::new(now(), 101.0),
                ],
                Duration::hours(1),
            ),
        );

        let report = analyzer.analyze_windows(&windows)[&1];
        assert_eq!(report.statistics.std_return, 0.0);
        assert_eq!(report.probability.p_up, 0.5);
        assert_eq!(report.volatility.label, VolatilityLabel::Low);
        assert_eq!(report.trend.trend, Trend::Neutral);
        assert!((report.statistics.change_pct - 0.01).abs() < 1e-12);
    }

    #[test]
    fn empty_window_is_skipped_not_fatal() {
        let analyzer = AnalyzerImpl::new(&AppConfig::default());
        let mut windows = BTreeMap::new();
        windows.insert(2, PriceSeries::new(Vec::new(), Duration::hours(1)));
        windows.insert(3, hourly_series(72));

        let reports = analyzer.analyze_windows(&windows);
        assert!(!reports.contains_key(&2));
        assert!(reports.contains_key(&3));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let analyzer = AnalyzerImpl::new(&AppConfig::default());
        let series = hourly_series(30 * 24);

        let first = analyzer.analyze_series(&series, now());
        let second = analyzer.analyze_series(&series, now());
        assert_eq!(first, second);
    }
}
