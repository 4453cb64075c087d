use serde_json::Value;
use thiserror::Error;

/// Error reported by the dialog engine or search backend. The caller receives
/// the upstream's status code and body unchanged.
#[derive(Clone, Debug, Error)]
#[error("upstream service returned status {status}")]
pub struct UpstreamError {
    pub status: u16,
    pub body: Value,
}

impl UpstreamError {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn transport(detail: impl std::fmt::Display) -> Self {
        Self { status: 500, body: Value::String(detail.to_string()) }
    }
}

/// Price feed failures never carry a useful upstream body; they are logged
/// and answered with a terminal 502 instead of leaving the request hanging.
#[derive(Debug, Error)]
pub enum PriceFeedError {
    #[error("price feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("price feed returned an unexpected payload: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    PriceFeed(#[from] PriceFeedError),
}
