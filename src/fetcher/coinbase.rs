use crate::fetcher::traits::MarketDataSource;
use crate::model::{FetchError, PricePoint, PriceSeries};
use crate::utils::secs_to_datetime;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

const NAME: &str = "Coinbase";

/// Exchange limit on candles per request.
const MAX_CANDLES_PER_REQUEST: i32 = 300;

/// Fallback source: Coinbase Exchange candles, close price per bucket.
pub struct CoinbaseSource {
    client: Client,
    url: String,
    granularity_seconds: u32,
}

impl CoinbaseSource {
    pub fn new(client: Client, url: String, granularity_seconds: u32) -> Self {
        Self { client, url, granularity_seconds }
    }

    fn granularity(&self) -> Duration {
        Duration::seconds(i64::from(self.granularity_seconds))
    }

    /// `[start, end)` ranges of at most `MAX_CANDLES_PER_REQUEST` candles
    /// covering `start..end`.
    pub fn request_ranges(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Duration,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let step = granularity * MAX_CANDLES_PER_REQUEST;
        let mut ranges = Vec::new();
        let mut from = start;
        while from < end {
            let to = (from + step).min(end);
            ranges.push((from, to));
            from = to;
        }
        ranges
    }

    /// Parses `[[time, low, high, open, close, volume], ...]` into points.
    pub fn parse_candles(body: &str) -> Result<Vec<PricePoint>, FetchError> {
        let candles: Vec<Vec<f64>> = serde_json::from_str(body)
            .map_err(|e| FetchError::InvalidPayload(format!("{}: {}", NAME, e)))?;

        let mut points = Vec::with_capacity(candles.len());
        for candle in candles {
            let &[time, _low, _high, _open, close, ..] = candle.as_slice() else {
                return Err(FetchError::InvalidPayload(format!(
                    "{}: candle with {} fields",
                    NAME,
                    candle.len()
                )));
            };
            if !(close.is_finite() && close > 0.0) {
                continue;
            }
            if let Some(timestamp) = secs_to_datetime(time) {
                points.push(PricePoint::new(timestamp, close));
            }
        }
        Ok(points)
    }

    async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("granularity", self.granularity_seconds.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited(NAME));
        }
        if !status.is_success() {
            return Err(FetchError::BadStatus { source_name: NAME, status });
        }

        let body = response.text().await?;
        Self::parse_candles(&body)
    }
}

#[async_trait::async_trait]
impl MarketDataSource for CoinbaseSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, max_days: u32) -> Result<PriceSeries, FetchError> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(max_days));

        let mut points = Vec::new();
        for (from, to) in Self::request_ranges(start, end, self.granularity()) {
            debug!("{}: requesting candles {} .. {}", NAME, from, to);
            points.extend(self.fetch_range(from, to).await?);
        }

        if points.is_empty() {
            return Err(FetchError::Empty(NAME));
        }

        // Pages overlap at their edges and come back newest first.
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);

        info!("✅ {}: {} candles", NAME, points.len());
        Ok(PriceSeries::new(points, self.granularity()))
    }
}
