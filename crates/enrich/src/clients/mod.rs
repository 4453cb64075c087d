//! Outbound service seams and their wire types.

use async_trait::async_trait;
use serde::Deserialize;

use coinbot_core::dialog::{DialogResponse, MessagePayload};

use crate::error::{PriceFeedError, UpstreamError};

mod dialog;
mod price;
mod search;

pub use dialog::HttpDialogClient;
pub use price::HttpPriceFeed;
pub use search::HttpSearchBackend;

/// Restricts search hits to documents from the last day with strong entity
/// relevance. Shared by the sentiment and article queries.
pub const RECENT_RELEVANT_FILTER: &str =
    "[publication_date>=now-1day, enriched_text.entities.relevance>=.8]";

/// Average document sentiment plus a per-label count, capped at 3 buckets.
pub const SENTIMENT_AGGREGATION: &str = "[average(enriched_text.sentiment.document.score),term(enriched_text.sentiment.document.label,count:3)]";

#[async_trait]
pub trait DialogClient: Send + Sync {
    async fn message(&self, payload: &MessagePayload) -> Result<DialogResponse, UpstreamError>;
}

/// First element of the price feed's ticker array. Both values arrive as
/// strings and are reparsed by the price handler.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TickerQuote {
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub percent_change_24h: Option<String>,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current USD quote for an asset slug; `None` when the feed returns an
    /// empty array for the asset.
    async fn ticker(&self, slug: &str) -> Result<Option<TickerQuote>, PriceFeedError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub filter: String,
    pub aggregation: Option<String>,
    pub fields: Option<String>,
    pub count: u32,
}

impl SearchQuery {
    /// Sentiment lookup: 3 documents plus score/label aggregations.
    pub fn sentiment(slug: &str) -> Self {
        Self {
            query: slug.to_owned(),
            filter: RECENT_RELEVANT_FILTER.to_owned(),
            aggregation: Some(SENTIMENT_AGGREGATION.to_owned()),
            fields: None,
            count: 3,
        }
    }

    /// Article lookup: top 5 documents, title and url only.
    pub fn articles(slug: &str) -> Self {
        Self {
            query: slug.to_owned(),
            filter: RECENT_RELEVANT_FILTER.to_owned(),
            aggregation: None,
            fields: Some("title,url".to_owned()),
            count: 5,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AggregationBucket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub matching_results: u64,
}

/// One backend aggregation: an `average` carries `value`, a `term` carries
/// `results` buckets. Unused halves deserialize to their defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Aggregation {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub results: Vec<AggregationBucket>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub matching_results: u64,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn query(&self, query: &SearchQuery) -> Result<SearchResponse, UpstreamError>;
}
