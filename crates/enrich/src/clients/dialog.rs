use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use coinbot_core::config::DialogConfig;
use coinbot_core::dialog::{DialogResponse, MessagePayload};

use crate::error::UpstreamError;

use super::DialogClient;

/// Dialog engine message API over HTTP basic auth.
pub struct HttpDialogClient {
    client: Client,
    base_url: String,
    username: SecretString,
    password: SecretString,
    version_date: String,
}

impl HttpDialogClient {
    pub fn new(config: &DialogConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_owned(),
            username: config.username.clone(),
            password: config.password.clone(),
            version_date: config.version_date.clone(),
        }
    }
}

#[async_trait::async_trait]
impl DialogClient for HttpDialogClient {
    async fn message(&self, payload: &MessagePayload) -> Result<DialogResponse, UpstreamError> {
        let url = format!("{}/v1/workspaces/{}/message", self.base_url, payload.workspace_id);

        let response = self
            .client
            .post(&url)
            .query(&[("version", self.version_date.as_str())])
            .basic_auth(self.username.expose_secret(), Some(self.password.expose_secret()))
            .json(payload)
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(UpstreamError::new(status.as_u16(), body));
        }

        response.json::<DialogResponse>().await.map_err(UpstreamError::transport)
    }
}
