use std::sync::Arc;

use axum::Router;
use secrecy::SecretString;
use thiserror::Error;
use tower_http::services::ServeDir;
use tracing::info;

use coinbot_core::config::{AppConfig, ConfigError, LoadOptions};
use coinbot_db::{connect_with_settings, migrations, AuditRepository, DbPool, SqlAuditRepository};
use coinbot_enrich::clients::{HttpDialogClient, HttpPriceFeed, HttpSearchBackend};
use coinbot_enrich::{Enricher, PriceFeedError};

use crate::routes::{self, AppState};
use crate::{admin, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: Option<DbPool>,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("audit database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("audit database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("price feed client initialization failed: {0}")]
    PriceFeed(#[source] PriceFeedError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Wires clients, optional audit store, and the router from an already
/// validated config. Config validation has rejected incomplete audit
/// credentials by this point, so `audit.enabled()` implies both are present.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let mut db_pool = None;
    let mut audit: Option<Arc<dyn AuditRepository>> = None;
    if let Some(database_url) = &config.audit.database_url {
        let pool = connect_with_settings(
            database_url,
            config.audit.max_connections,
            config.audit.acquire_timeout_secs,
        )
        .await
        .map_err(BootstrapError::DatabaseConnect)?;
        migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
        info!(
            event_name = "system.bootstrap.audit_store_ready",
            "audit store connected and migrated"
        );
        audit = Some(Arc::new(SqlAuditRepository::new(pool.clone())));
        db_pool = Some(pool);
    }

    let dialog = Arc::new(HttpDialogClient::new(&config.dialog));
    let price = Arc::new(HttpPriceFeed::new(&config.price).map_err(BootstrapError::PriceFeed)?);
    let search = Arc::new(HttpSearchBackend::new(&config.search));
    let enricher = Arc::new(Enricher::new(price, search));

    let state = AppState {
        workspace_id: config.dialog.workspace_id.clone(),
        dialog,
        enricher,
        audit: audit.clone(),
    };

    let mut router = routes::api_router(state).merge(health::router(db_pool.clone()));

    if let Some(repo) = audit {
        let user = config.audit.user.clone().unwrap_or_default();
        let pass = config.audit.pass.clone().unwrap_or_else(|| SecretString::from(String::new()));
        router = router.merge(admin::router(repo, user, pass));
    }

    router = router.fallback_service(ServeDir::new(&config.server.static_dir));

    info!(event_name = "system.bootstrap.completed", "application bootstrap finished");
    Ok(Application { config, db_pool, router })
}
