// Core structs: price series, per-window analytics, errors
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Ascending sequence of price points together with the spacing the
/// source sampled them at.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
    sampling_period: Duration,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>, sampling_period: Duration) -> Self {
        Self { points, sampling_period }
    }

    /// Builds a series whose sampling period is the median spacing of the
    /// given points. Falls back to one day when there is no spacing to
    /// measure.
    pub fn from_points(points: Vec<PricePoint>) -> Self {
        let sampling_period = infer_sampling_period(&points);
        Self { points, sampling_period }
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn sampling_period(&self) -> Duration {
        self.sampling_period
    }

    /// Points with `timestamp >= cutoff`, in their original order. The result
    /// keeps the parent's sampling period.
    pub fn since(&self, cutoff: DateTime<Utc>) -> PriceSeries {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp >= cutoff)
                .copied()
                .collect(),
            sampling_period: self.sampling_period,
        }
    }
}

fn infer_sampling_period(points: &[PricePoint]) -> Duration {
    let mut gaps: Vec<Duration> = points
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .filter(|d| *d > Duration::zero())
        .collect();

    if gaps.is_empty() {
        return Duration::days(1);
    }

    gaps.sort();
    gaps[gaps.len() / 2]
}

/// Moments of a return series plus the raw open/close of the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStatistics {
    pub mean_return: f64,
    pub std_return: f64,
    pub open_price: f64,
    pub close_price: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityEstimate {
    pub p_up: f64,
    pub p_down: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolatilityLabel {
    Low,
    Medium,
    High,
}

impl fmt::Display for VolatilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolatilityLabel::Low => "LOW",
            VolatilityLabel::Medium => "MEDIUM",
            VolatilityLabel::High => "HIGH",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityAssessment {
    pub annual_volatility: f64,
    pub label: VolatilityLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Up => "UP",
            Trend::Down => "DOWN",
            Trend::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendAssessment {
    pub trend: Trend,
    pub strength: f64,
}

impl TrendAssessment {
    pub fn neutral() -> Self {
        Self { trend: Trend::Neutral, strength: 0.0 }
    }
}

/// Everything computed for one lookback window in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowReport {
    pub days: u32,
    pub statistics: WindowStatistics,
    pub probability: ProbabilityEstimate,
    pub volatility: VolatilityAssessment,
    pub trend: TrendAssessment,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0} rate limit hit")]
    RateLimited(&'static str),
    #[error("{source_name} responded with status {status}")]
    BadStatus {
        source_name: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0} returned no price points")]
    Empty(&'static str),
    #[error("primary source failed ({primary}); fallback failed ({fallback})")]
    AllSourcesFailed {
        primary: Box<FetchError>,
        fallback: Box<FetchError>,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    #[test]
    fn sampling_period_is_median_gap() {
        let points = vec![
            PricePoint::new(at(0), 1.0),
            PricePoint::new(at(1), 1.0),
            PricePoint::new(at(2), 1.0),
            PricePoint::new(at(10), 1.0),
        ];
        let series = PriceSeries::from_points(points);
        assert_eq!(series.sampling_period(), Duration::hours(1));
    }

    #[test]
    fn sampling_period_defaults_to_one_day() {
        let series = PriceSeries::from_points(vec![PricePoint::new(at(0), 1.0)]);
        assert_eq!(series.sampling_period(), Duration::days(1));
    }

    #[test]
    fn since_keeps_inclusive_suffix_and_period() {
        let points = (0..5).map(|h| PricePoint::new(at(h), h as f64 + 1.0)).collect();
        let series = PriceSeries::new(points, Duration::hours(1));

        let tail = series.since(at(3));
        assert_eq!(tail.prices(), vec![4.0, 5.0]);
        assert_eq!(tail.sampling_period(), Duration::hours(1));

        assert!(series.since(at(6)).is_empty());
        assert_eq!(series.since(at(-1)).len(), 5);
    }

    #[test]
    fn labels_render_upper_case() {
        assert_eq!(Trend::Neutral.to_string(), "NEUTRAL");
        assert_eq!(VolatilityLabel::Medium.to_string(), "MEDIUM");
    }
}
