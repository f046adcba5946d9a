use crate::model::FetchError;
use csv::{ReaderBuilder, Trim};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

const NAME: &str = "Stooq";

#[derive(Debug, Deserialize)]
struct DailyRow {
    #[serde(rename = "Close")]
    close: String,
}

/// Daily closes of a tech index ETF, used as a comparison column.
pub struct StooqTechSource {
    client: Client,
    url: String,
    symbol: String,
}

impl StooqTechSource {
    pub fn new(client: Client, url: String, symbol: String) -> Self {
        Self { client, url, symbol }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Close column of a Stooq daily CSV, oldest first. Rows without a
    /// numeric close (Stooq writes `-` on holidays) are skipped.
    pub fn parse_closes(body: &str) -> Result<Vec<f64>, FetchError> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers = reader.headers()?;
        if !headers.iter().any(|col| col == "Close") {
            return Err(FetchError::InvalidPayload(format!("{}: no Close column", NAME)));
        }

        let mut closes = Vec::new();
        for result in reader.deserialize::<DailyRow>() {
            let Ok(row) = result else { continue };
            match row.close.parse::<f64>() {
                Ok(close) if close.is_finite() && close > 0.0 => closes.push(close),
                _ => {}
            }
        }
        Ok(closes)
    }

    /// Change over the last `days` closes for each window, or `None` when
    /// there are not `days + 1` closes to compare.
    pub fn period_changes(closes: &[f64], windows: &[u32]) -> HashMap<u32, Option<f64>> {
        windows
            .iter()
            .map(|&days| {
                let n = days as usize;
                let change = (closes.len() > n).then(|| {
                    let start = closes[closes.len() - n - 1];
                    let end = closes[closes.len() - 1];
                    (end - start) / start
                });
                (days, change)
            })
            .collect()
    }

    pub async fn get_period_changes(
        &self,
        windows: &[u32],
    ) -> Result<HashMap<u32, Option<f64>>, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus { source_name: NAME, status });
        }

        let body = response.text().await?;
        let closes = Self::parse_closes(&body)?;
        if closes.is_empty() {
            return Err(FetchError::Empty(NAME));
        }

        info!("✅ {}: {} daily closes for {}", NAME, closes.len(), self.symbol);
        Ok(Self::period_changes(&closes, windows))
    }
}
