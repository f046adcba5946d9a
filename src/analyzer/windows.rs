use crate::model::PriceSeries;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Splits `series` into trailing windows measured back from `now`.
///
/// Every window is cut against the same `now`, so the caller must capture it
/// once per cycle. Windows with fewer than two points are left out.
pub fn split_by_time_windows(
    series: &PriceSeries,
    windows: &[u32],
    now: DateTime<Utc>,
) -> BTreeMap<u32, PriceSeries> {
    let mut result = BTreeMap::new();

    for &days in windows {
        let cutoff = now - Duration::days(i64::from(days));
        let window = series.since(cutoff);

        if window.len() < 2 {
            debug!("Dropping {}d window: only {} point(s)", days, window.len());
            continue;
        }

        result.insert(days, window);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64, price: f64) -> PricePoint {
        PricePoint::new(now() - Duration::days(days), price)
    }

    fn series() -> PriceSeries {
        PriceSeries::new(
            vec![
                days_ago(20, 100.0),
                days_ago(9, 101.0),
                days_ago(4, 102.0),
                days_ago(2, 103.0),
                days_ago(0, 104.0),
            ],
            Duration::days(1),
        )
    }

    #[test]
    fn windows_are_trailing_suffixes() {
        let out = split_by_time_windows(&series(), &[30, 10, 5], now());

        assert_eq!(out[&30].len(), 5);
        assert_eq!(out[&10].prices(), vec![101.0, 102.0, 103.0, 104.0]);
        assert_eq!(out[&5].prices(), vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let out = split_by_time_windows(&series(), &[4], now());
        assert_eq!(out[&4].prices(), vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn windows_with_one_or_zero_points_are_dropped() {
        let one_point = split_by_time_windows(&series(), &[1], now());
        assert!(!one_point.contains_key(&1));

        let empty = PriceSeries::new(vec![days_ago(40, 1.0)], Duration::days(1));
        let zero_points = split_by_time_windows(&empty, &[30], now());
        assert!(zero_points.is_empty());
    }

    #[test]
    fn windows_inherit_sampling_period() {
        let out = split_by_time_windows(&series(), &[30], now());
        assert_eq!(out[&30].sampling_period(), Duration::days(1));
    }
}
