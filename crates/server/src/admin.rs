//! Administrative endpoints, mounted only when audit logging is configured
//! and guarded by HTTP basic authentication:
//!
//! - `POST /clearDb` — empty the audit store
//! - `GET  /chats`   — download all audit records as CSV

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{error, info};

use coinbot_core::{render_csv, ChatRow};
use coinbot_db::AuditRepository;

#[derive(Clone)]
struct AdminState {
    repo: Arc<dyn AuditRepository>,
    user: String,
    pass: SecretString,
}

pub fn router(repo: Arc<dyn AuditRepository>, user: String, pass: SecretString) -> Router {
    let state = AdminState { repo, user, pass };
    Router::new()
        .route("/clearDb", post(clear_db))
        .route("/chats", get(chats))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

fn credentials_match(state: &AdminState, header: &str) -> bool {
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(encoded.trim()) else {
        return false;
    };
    let Ok(pair) = String::from_utf8(decoded) else {
        return false;
    };
    match pair.split_once(':') {
        Some((user, pass)) => user == state.user && pass == state.pass.expose_secret(),
        None => false,
    }
}

async fn require_basic_auth(
    State(state): State<AdminState>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|header| credentials_match(&state, header));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            [(WWW_AUTHENTICATE, "Basic realm=\"coinbot-admin\"")],
        )
            .into_response();
    }

    next.run(request).await
}

async fn clear_db(State(state): State<AdminState>) -> Response {
    match state.repo.reset().await {
        Ok(()) => {
            info!(event_name = "admin.audit.cleared", "audit store cleared");
            Json(json!({"message": "Clearing db"})).into_response()
        }
        Err(repo_error) => {
            error!(
                event_name = "admin.audit.clear_failed",
                error = %repo_error,
                "audit store reset failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": repo_error.to_string()})),
            )
                .into_response()
        }
    }
}

async fn chats(State(state): State<AdminState>) -> Response {
    let records = match state.repo.list_all().await {
        Ok(records) => records,
        Err(repo_error) => {
            error!(
                event_name = "admin.audit.list_failed",
                error = %repo_error,
                "audit record listing failed"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": repo_error.to_string()})),
            )
                .into_response();
        }
    };

    let rows: Vec<ChatRow> = records.iter().map(ChatRow::from_record).collect();
    let document = render_csv(&rows);

    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"chats.csv\""),
        ],
        document,
    )
        .into_response()
}
