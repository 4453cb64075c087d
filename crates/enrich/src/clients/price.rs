use std::time::Duration;

use reqwest::Client;

use coinbot_core::config::PriceConfig;

use crate::error::PriceFeedError;

use super::{PriceFeed, TickerQuote};

/// Spot price feed ticker API. The configured timeout guarantees every
/// request terminates; without it a dead feed would leave the dialog request
/// unanswered forever.
pub struct HttpPriceFeed {
    client: Client,
    base_url: String,
}

impl HttpPriceFeed {
    pub fn new(config: &PriceConfig) -> Result<Self, PriceFeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(PriceFeedError::Transport)?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }
}

#[async_trait::async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn ticker(&self, slug: &str) -> Result<Option<TickerQuote>, PriceFeedError> {
        let url = format!("{}/ticker/{}/", self.base_url, slug);

        let response = self
            .client
            .get(&url)
            .query(&[("convert", "USD")])
            .send()
            .await?
            .error_for_status()?;

        let quotes = response.json::<Vec<TickerQuote>>().await.map_err(|err| {
            PriceFeedError::Decode(format!("expected a JSON quote array: {err}"))
        })?;

        Ok(quotes.into_iter().next())
    }
}
