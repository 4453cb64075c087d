use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use coinbot_core::dialog::{DialogResponse, MessagePayload};
use coinbot_core::AuditRecord;

use crate::DbPool;

use super::{AuditRepository, RepositoryError};

pub struct SqlAuditRepository {
    pool: DbPool,
}

impl SqlAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<AuditRecord, RepositoryError> {
        let id_raw: String = row.get("id");
        let id = Uuid::parse_str(&id_raw)
            .map_err(|err| RepositoryError::Decode(format!("invalid audit id `{id_raw}`: {err}")))?;

        let request_raw: String = row.get("request");
        let request: MessagePayload = serde_json::from_str(&request_raw)
            .map_err(|err| RepositoryError::Decode(format!("invalid request payload: {err}")))?;

        let response_raw: String = row.get("response");
        let response: DialogResponse = serde_json::from_str(&response_raw)
            .map_err(|err| RepositoryError::Decode(format!("invalid response payload: {err}")))?;

        let time_raw: String = row.get("logged_at");
        let time = DateTime::parse_from_rfc3339(&time_raw)
            .map_err(|err| RepositoryError::Decode(format!("invalid timestamp `{time_raw}`: {err}")))?
            .with_timezone(&Utc);

        Ok(AuditRecord { id, request, response, time })
    }
}

#[async_trait]
impl AuditRepository for SqlAuditRepository {
    async fn append(&self, record: AuditRecord) -> Result<(), RepositoryError> {
        let request = serde_json::to_string(&record.request)
            .map_err(|err| RepositoryError::Decode(format!("request not serializable: {err}")))?;
        let response = serde_json::to_string(&record.response)
            .map_err(|err| RepositoryError::Decode(format!("response not serializable: {err}")))?;

        sqlx::query(
            "INSERT INTO audit_log (id, request, response, logged_at) VALUES (?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(request)
        .bind(response)
        .bind(record.time.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AuditRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT id, request, response, logged_at FROM audit_log ORDER BY logged_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::decode_row).collect()
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM audit_log").execute(&self.pool).await?;
        Ok(())
    }
}
