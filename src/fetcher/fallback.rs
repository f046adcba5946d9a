use crate::fetcher::traits::MarketDataSource;
use crate::model::{FetchError, PriceSeries};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Tries `primary`, and on any error waits `delay` and tries `fallback`.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    delay: Duration,
}

impl<P, F> FallbackSource<P, F>
where
    P: MarketDataSource,
    F: MarketDataSource,
{
    pub fn new(primary: P, fallback: F, delay: Duration) -> Self {
        Self { primary, fallback, delay }
    }
}

#[async_trait::async_trait]
impl<P, F> MarketDataSource for FallbackSource<P, F>
where
    P: MarketDataSource,
    F: MarketDataSource,
{
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn fetch(&self, max_days: u32) -> Result<PriceSeries, FetchError> {
        let primary_err = match self.primary.fetch(max_days).await {
            Ok(series) => return Ok(series),
            Err(e) => e,
        };

        warn!("⚠️ {} failed: {}", self.primary.name(), primary_err);
        warn!("➡️ Switching to {} fallback...", self.fallback.name());
        sleep(self.delay).await;

        self.fallback
            .fetch(max_days)
            .await
            .map_err(|fallback_err| FetchError::AllSourcesFailed {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
    }
}
