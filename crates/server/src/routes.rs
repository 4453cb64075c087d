//! The message API: the inbound half of the enrichment pipeline.
//!
//! `POST /api/message` forwards the caller's input and context to the dialog
//! engine, runs the enrichment dispatcher over the engine's response, records
//! the pair in the audit store when the outcome calls for it, and returns the
//! final response body.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use coinbot_core::dialog::{MessageInput, MessagePayload};
use coinbot_core::AuditRecord;
use coinbot_db::AuditRepository;
use coinbot_enrich::clients::DialogClient;
use coinbot_enrich::{EnrichError, Enricher, UpstreamError};

#[derive(Clone)]
pub struct AppState {
    pub workspace_id: Option<String>,
    pub dialog: Arc<dyn DialogClient>,
    pub enricher: Arc<Enricher>,
    pub audit: Option<Arc<dyn AuditRepository>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub input: Option<MessageInput>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

pub fn api_router(state: AppState) -> Router {
    Router::new().route("/api/message", post(message)).with_state(state)
}

fn unconfigured_payload() -> Value {
    json!({
        "output": {
            "text": "The app has not been configured with a WORKSPACE_ID environment \
                     variable. Set WORKSPACE_ID to the dialog workspace that should serve \
                     this application and restart the server."
        }
    })
}

fn upstream_reply(upstream: UpstreamError) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(upstream.body)).into_response()
}

async fn message(
    State(state): State<AppState>,
    body: Option<Json<MessageRequest>>,
) -> Response {
    // Checked synchronously before any outbound call; an unconfigured
    // workspace answers with instructions instead of erroring.
    let Some(workspace_id) = state.workspace_id.clone() else {
        return Json(unconfigured_payload()).into_response();
    };

    let Json(body) = body.unwrap_or_default();

    let payload = MessagePayload {
        workspace_id,
        context: body.context.unwrap_or_default(),
        input: body.input.unwrap_or_default(),
    };

    let mut response = match state.dialog.message(&payload).await {
        Ok(response) => response,
        Err(upstream) => {
            warn!(
                event_name = "api.message.dialog_error",
                status = upstream.status,
                "dialog engine returned an error"
            );
            return upstream_reply(upstream);
        }
    };

    match state.enricher.enrich(&mut response).await {
        Ok(outcome) => {
            if outcome.audited() {
                record_audit(&state, &payload, &response);
            }
            Json(response).into_response()
        }
        Err(EnrichError::Upstream(upstream)) => {
            warn!(
                event_name = "api.message.search_error",
                status = upstream.status,
                "search backend returned an error"
            );
            upstream_reply(upstream)
        }
        Err(EnrichError::PriceFeed(feed_error)) => {
            error!(
                event_name = "api.message.price_feed_error",
                error = %feed_error,
                "price feed fetch failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "price feed unavailable", "detail": feed_error.to_string()})),
            )
                .into_response()
        }
    }
}

/// Fire-and-forget audit append; the reply never waits on the store.
fn record_audit(
    state: &AppState,
    payload: &MessagePayload,
    response: &coinbot_core::DialogResponse,
) {
    let Some(repo) = state.audit.clone() else {
        return;
    };
    let record = AuditRecord::new(payload.clone(), response.clone());
    tokio::spawn(async move {
        if let Err(repo_error) = repo.append(record).await {
            error!(
                event_name = "api.message.audit_append_failed",
                error = %repo_error,
                "audit record was not persisted"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use coinbot_core::dialog::{DialogResponse, Intent, OutputPayload};
    use coinbot_core::AuditRecord;
    use coinbot_db::{AuditRepository, InMemoryAuditRepository};
    use coinbot_enrich::clients::{
        DialogClient, PriceFeed, SearchBackend, SearchQuery, SearchResponse, SearchResult,
        TickerQuote,
    };
    use coinbot_enrich::{Enricher, PriceFeedError, UpstreamError};

    use super::{api_router, AppState};

    struct StubDialog(Result<DialogResponse, UpstreamError>);

    #[async_trait]
    impl DialogClient for StubDialog {
        async fn message(
            &self,
            _payload: &coinbot_core::dialog::MessagePayload,
        ) -> Result<DialogResponse, UpstreamError> {
            self.0.clone()
        }
    }

    struct StubPrice(Option<TickerQuote>);

    #[async_trait]
    impl PriceFeed for StubPrice {
        async fn ticker(&self, _slug: &str) -> Result<Option<TickerQuote>, PriceFeedError> {
            Ok(self.0.clone())
        }
    }

    struct FailingPrice;

    #[async_trait]
    impl PriceFeed for FailingPrice {
        async fn ticker(&self, _slug: &str) -> Result<Option<TickerQuote>, PriceFeedError> {
            Err(PriceFeedError::Decode("connection reset".to_owned()))
        }
    }

    struct StubSearch(Result<SearchResponse, UpstreamError>);

    #[async_trait]
    impl SearchBackend for StubSearch {
        async fn query(&self, _query: &SearchQuery) -> Result<SearchResponse, UpstreamError> {
            self.0.clone()
        }
    }

    fn dialog_response(intent: &str, currency: &str, template: &str) -> DialogResponse {
        let mut response = DialogResponse {
            intents: vec![Intent { intent: intent.to_owned(), confidence: 0.9 }],
            output: Some(OutputPayload {
                text: vec![template.to_owned()],
                ..OutputPayload::default()
            }),
            ..DialogResponse::default()
        };
        response.context.insert("currency".to_owned(), json!(currency));
        response
    }

    struct StateBuilder {
        workspace_id: Option<String>,
        dialog: Arc<dyn DialogClient>,
        price: Arc<dyn PriceFeed>,
        search: Arc<dyn SearchBackend>,
        audit: Option<Arc<InMemoryAuditRepository>>,
    }

    impl StateBuilder {
        fn new(dialog_result: Result<DialogResponse, UpstreamError>) -> Self {
            Self {
                workspace_id: Some("wk-test".to_owned()),
                dialog: Arc::new(StubDialog(dialog_result)),
                price: Arc::new(StubPrice(None)),
                search: Arc::new(StubSearch(Ok(SearchResponse::default()))),
                audit: None,
            }
        }

        fn build(self) -> AppState {
            AppState {
                workspace_id: self.workspace_id,
                dialog: self.dialog,
                enricher: Arc::new(Enricher::new(self.price, self.search)),
                audit: self.audit.map(|repo| repo as Arc<dyn AuditRepository>),
            }
        }
    }

    async fn post_message(state: AppState, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/message")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        let response = api_router(state).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn wait_for_records(repo: &InMemoryAuditRepository, expected: usize) -> Vec<AuditRecord> {
        for _ in 0..50 {
            let records = repo.list_all().await.expect("list");
            if records.len() >= expected {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        repo.list_all().await.expect("list")
    }

    #[tokio::test]
    async fn unconfigured_workspace_answers_with_instructions() {
        let mut builder = StateBuilder::new(Ok(DialogResponse::default()));
        builder.workspace_id = None;

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::OK);
        let text = body["output"]["text"].as_str().expect("instructional text");
        assert!(text.contains("WORKSPACE_ID"));
    }

    #[tokio::test]
    async fn price_intent_returns_enriched_output_and_audits_once() {
        let request_start = Utc::now();
        let mut builder =
            StateBuilder::new(Ok(dialog_response("price", "BTC", "Price is {0}, change {1}.")));
        builder.price = Arc::new(StubPrice(Some(TickerQuote {
            price_usd: Some("8000".to_owned()),
            percent_change_24h: Some("5".to_owned()),
        })));
        let repo = Arc::new(InMemoryAuditRepository::default());
        builder.audit = Some(repo.clone());

        let (status, body) =
            post_message(builder.build(), json!({"input": {"text": "price of BTC"}})).await;

        assert_eq!(status, StatusCode::OK);
        let text = body["output"]["text"][0].as_str().expect("output line");
        assert!(text.contains("8000"));
        assert!(text.contains("up 5"));

        let records = wait_for_records(&repo, 1).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].time >= request_start);
        assert_eq!(records[0].request.input.text.as_deref(), Some("price of BTC"));
    }

    #[tokio::test]
    async fn pass_through_without_currency_is_audited() {
        let response = DialogResponse {
            output: Some(OutputPayload {
                text: vec!["Hello!".to_owned()],
                ..OutputPayload::default()
            }),
            ..DialogResponse::default()
        };
        let mut builder = StateBuilder::new(Ok(response));
        let repo = Arc::new(InMemoryAuditRepository::default());
        builder.audit = Some(repo.clone());

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"]["text"][0], json!("Hello!"));
        assert_eq!(wait_for_records(&repo, 1).await.len(), 1);
    }

    #[tokio::test]
    async fn sentiment_path_is_not_audited() {
        let mut builder = StateBuilder::new(Ok(dialog_response(
            "sentiment",
            "ETH",
            "Mood: {0} across {1} articles.",
        )));
        builder.search = Arc::new(StubSearch(Ok(SearchResponse {
            matching_results: 9,
            results: vec![SearchResult::default()],
            aggregations: vec![],
        })));
        let repo = Arc::new(InMemoryAuditRepository::default());
        builder.audit = Some(repo.clone());

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::OK);
        let text = body["output"]["text"][0].as_str().expect("output line");
        assert!(text.contains("neutral"));
        assert!(text.contains("9"));

        // give a straggling spawn a chance to land before asserting zero
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(repo.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn dialog_engine_errors_pass_through_status_and_body() {
        let upstream = UpstreamError::new(503, json!({"error": "workspace unavailable"}));
        let builder = StateBuilder::new(Err(upstream));

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], json!("workspace unavailable"));
    }

    #[tokio::test]
    async fn search_backend_errors_pass_through_status_and_body() {
        let mut builder =
            StateBuilder::new(Ok(dialog_response("view_articles", "XRP", "{0} {1}")));
        builder.search = Arc::new(StubSearch(Err(UpstreamError::new(
            429,
            json!({"error": "rate limited"}),
        ))));
        let repo = Arc::new(InMemoryAuditRepository::default());
        builder.audit = Some(repo.clone());

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], json!("rate limited"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(repo.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn price_feed_failure_gets_a_terminal_502_reply() {
        let mut builder = StateBuilder::new(Ok(dialog_response("price", "BTC", "{0}")));
        builder.price = Arc::new(FailingPrice);

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], json!("price feed unavailable"));
    }

    #[tokio::test]
    async fn absent_output_is_defaulted_in_the_reply() {
        let mut response = DialogResponse::default();
        response.context.insert("currency".to_owned(), json!("BTC"));
        let builder = StateBuilder::new(Ok(response));

        let (status, body) = post_message(builder.build(), json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"]["text"], json!([]));
    }
}
