use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use coinbot_core::config::SearchConfig;

use crate::error::UpstreamError;

use super::{SearchBackend, SearchQuery, SearchResponse};

/// Document search/aggregation backend query API.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
    username: SecretString,
    password: SecretString,
    version_date: String,
    environment_id: String,
    collection_id: String,
}

impl HttpSearchBackend {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_owned(),
            username: config.username.clone(),
            password: config.password.clone(),
            version_date: config.version_date.clone(),
            environment_id: config.environment_id.clone(),
            collection_id: config.collection_id.clone(),
        }
    }
}

#[async_trait::async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn query(&self, query: &SearchQuery) -> Result<SearchResponse, UpstreamError> {
        let url = format!(
            "{}/v1/environments/{}/collections/{}/query",
            self.base_url, self.environment_id, self.collection_id
        );

        let mut params: Vec<(&str, String)> = vec![
            ("version", self.version_date.clone()),
            ("natural_language_query", query.query.clone()),
            ("filter", query.filter.clone()),
            ("count", query.count.to_string()),
        ];
        if let Some(aggregation) = &query.aggregation {
            params.push(("aggregation", aggregation.clone()));
        }
        if let Some(fields) = &query.fields {
            params.push(("return", fields.clone()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .basic_auth(self.username.expose_secret(), Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(UpstreamError::new(status.as_u16(), body));
        }

        response.json::<SearchResponse>().await.map_err(UpstreamError::transport)
    }
}
