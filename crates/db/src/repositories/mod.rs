use async_trait::async_trait;
use thiserror::Error;

use coinbot_core::AuditRecord;

pub mod audit;
pub mod memory;

pub use audit::SqlAuditRepository;
pub use memory::InMemoryAuditRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only audit store. Records are immutable once appended; `list_all`
/// returns them ascending by timestamp for the export endpoint, and `reset`
/// implements the destroy-and-recreate semantics of the admin clear
/// operation.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<(), RepositoryError>;
    async fn list_all(&self) -> Result<Vec<AuditRecord>, RepositoryError>;
    async fn reset(&self) -> Result<(), RepositoryError>;
}
