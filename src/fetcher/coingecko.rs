use crate::fetcher::traits::MarketDataSource;
use crate::model::{FetchError, PricePoint, PriceSeries};
use crate::utils::millis_to_datetime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::info;

const NAME: &str = "CoinGecko";

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<[f64; 2]>,
}

/// Primary source: the CoinGecko market chart endpoint.
pub struct CoinGeckoSource {
    client: Client,
    url: String,
    vs_currency: String,
}

impl CoinGeckoSource {
    pub fn new(client: Client, url: String, vs_currency: String) -> Self {
        Self { client, url, vs_currency }
    }

    /// Parses `{"prices": [[ms, price], ...]}` into an ascending series.
    pub fn parse_market_chart(body: &str) -> Result<PriceSeries, FetchError> {
        let chart: MarketChart = serde_json::from_str(body)
            .map_err(|e| FetchError::InvalidPayload(format!("{}: {}", NAME, e)))?;

        let mut points: Vec<PricePoint> = chart
            .prices
            .iter()
            .filter(|[_, price]| price.is_finite() && *price > 0.0)
            .filter_map(|&[ms, price]| Some(PricePoint::new(millis_to_datetime(ms)?, price)))
            .collect();

        if points.is_empty() {
            return Err(FetchError::Empty(NAME));
        }

        points.sort_by_key(|p| p.timestamp);
        Ok(PriceSeries::from_points(points))
    }
}

#[async_trait::async_trait]
impl MarketDataSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, max_days: u32) -> Result<PriceSeries, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("vs_currency", self.vs_currency.clone()),
                ("days", max_days.to_string()),
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
        let series = Self::parse_market_chart(&body)?;
        info!(
            "✅ {}: {} points, sampling every {}s",
            NAME,
            series.len(),
            series.sampling_period().num_seconds()
        );
        Ok(series)
    }
}
