use crate::model::{FetchError, PriceSeries};

/// Something that can deliver BTC price history.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Ascending price history covering at least `max_days` days.
    async fn fetch(&self, max_days: u32) -> Result<PriceSeries, FetchError>;
}
