use tokio::sync::RwLock;

use coinbot_core::AuditRecord;

use super::{AuditRepository, RepositoryError};

/// In-memory audit store used by tests and as a stand-in where no sqlite
/// file is wanted.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    records: RwLock<Vec<AuditRecord>>,
}

#[async_trait::async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, record: AuditRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AuditRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut listed = records.clone();
        listed.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(listed)
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use coinbot_core::dialog::MessagePayload;
    use coinbot_core::{AuditRecord, DialogResponse};

    use crate::repositories::{AuditRepository, InMemoryAuditRepository};

    fn record_at(offset_minutes: i64) -> AuditRecord {
        let mut record = AuditRecord::new(MessagePayload::new("wk-1"), DialogResponse::default());
        record.time = Utc::now() + Duration::minutes(offset_minutes);
        record
    }

    #[tokio::test]
    async fn round_trip_and_ordering() {
        let repo = InMemoryAuditRepository::default();
        let late = record_at(10);
        let early = record_at(-10);

        repo.append(late.clone()).await.expect("append");
        repo.append(early.clone()).await.expect("append");

        let listed = repo.list_all().await.expect("list");
        assert_eq!(listed, vec![early, late]);
    }

    #[tokio::test]
    async fn reset_empties_the_store() {
        let repo = InMemoryAuditRepository::default();
        repo.append(record_at(0)).await.expect("append");
        repo.reset().await.expect("reset");
        assert!(repo.list_all().await.expect("list").is_empty());
    }
}
