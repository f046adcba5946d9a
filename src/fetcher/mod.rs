// Market data sources: BTC price history with fallback, plus the tech index.

pub mod coinbase;
pub mod coingecko;
pub mod fallback;
pub mod stooq;
pub mod traits;

pub use coinbase::CoinbaseSource;
pub use coingecko::CoinGeckoSource;
pub use fallback::FallbackSource;
pub use stooq::StooqTechSource;
pub use traits::MarketDataSource;

use crate::config::AppConfig;
use crate::model::FetchError;
use reqwest::Client;
use std::time::Duration;

pub type BtcSource = FallbackSource<CoinGeckoSource, CoinbaseSource>;

pub fn build_client(config: &AppConfig) -> Result<Client, FetchError> {
    let client = Client::builder()
        .user_agent(concat!("btc-pulse/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .build()?;
    Ok(client)
}

/// CoinGecko first, Coinbase if that fails.
pub fn btc_source(client: Client, config: &AppConfig) -> BtcSource {
    FallbackSource::new(
        CoinGeckoSource::new(
            client.clone(),
            config.coingecko_url.clone(),
            config.vs_currency.clone(),
        ),
        CoinbaseSource::new(
            client,
            config.coinbase_url.clone(),
            config.coinbase_granularity_seconds,
        ),
        Duration::from_secs(config.fallback_delay_seconds),
    )
}

pub fn tech_source(client: Client, config: &AppConfig) -> StooqTechSource {
    StooqTechSource::new(client, config.stooq_url.clone(), config.tech_symbol.clone())
}
