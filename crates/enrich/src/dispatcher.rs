use std::sync::Arc;

use tracing::info;

use coinbot_core::{normalize, DialogResponse, IntentKind};

use crate::clients::{PriceFeed, SearchBackend};
use crate::error::EnrichError;
use crate::{articles, price, sentiment};

/// Which path a response took through the dispatcher. Carries the audit
/// decision: price and pass-through replies are recorded, search-backed
/// replies are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    PassThrough,
    Price,
    Sentiment,
    Articles,
}

impl Outcome {
    pub fn audited(&self) -> bool {
        matches!(self, Self::PassThrough | Self::Price)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::Price => "price",
            Self::Sentiment => "sentiment",
            Self::Articles => "articles",
        }
    }
}

/// The enrichment dispatcher. Built once at startup; the client handles are
/// read-only and shared across requests.
pub struct Enricher {
    price: Arc<dyn PriceFeed>,
    search: Arc<dyn SearchBackend>,
}

impl Enricher {
    pub fn new(price: Arc<dyn PriceFeed>, search: Arc<dyn SearchBackend>) -> Self {
        Self { price, search }
    }

    /// Routes a dialog response to exactly one enrichment path, mutating its
    /// output text in place. Priority order, first match wins:
    ///
    /// 1. absent output is defaulted and nothing else runs;
    /// 2. with a `currency` context value, the top intent selects the price,
    ///    sentiment, or article handler;
    /// 3. everything else passes through unchanged.
    pub async fn enrich(&self, response: &mut DialogResponse) -> Result<Outcome, EnrichError> {
        if response.output.is_none() {
            response.ensure_output();
            return Ok(Outcome::PassThrough);
        }

        let Some(ticker) = response.currency() else {
            return Ok(Outcome::PassThrough);
        };
        let slug = normalize(ticker).to_owned();

        let outcome = match IntentKind::from_response(response) {
            Some(IntentKind::Price) => {
                price::apply(self.price.as_ref(), &slug, response).await?;
                Outcome::Price
            }
            Some(IntentKind::Sentiment) => {
                sentiment::apply(self.search.as_ref(), &slug, response).await?;
                Outcome::Sentiment
            }
            Some(IntentKind::ViewArticles) => {
                articles::apply(self.search.as_ref(), &slug, response).await?;
                Outcome::Articles
            }
            None => Outcome::PassThrough,
        };

        info!(
            event_name = "enrich.dispatch.completed",
            outcome = outcome.as_str(),
            asset = %slug,
            "enrichment path completed"
        );
        Ok(outcome)
    }
}
