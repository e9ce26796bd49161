//! Fingerprint duplicate detection against earlier reports

use sqlx::SqlitePool;
use trashio_common::Result;
use uuid::Uuid;

use crate::db;

#[derive(Clone)]
pub struct DuplicateDetector {
    db: SqlitePool,
}

impl DuplicateDetector {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Whether another report already used this before-image
    pub async fn is_duplicate_before(&self, fingerprint: &str, report_id: Uuid) -> Result<bool> {
        tracing::debug!(hash = %fingerprint, report_id = %report_id, "Checking before-image duplicates");
        let count = db::reports::count_by_before_hash_excluding(&self.db, fingerprint, report_id).await?;
        Ok(count > 0)
    }

    /// Whether another report already used this after-image
    pub async fn is_duplicate_after(&self, fingerprint: &str, report_id: Uuid) -> Result<bool> {
        tracing::debug!(hash = %fingerprint, report_id = %report_id, "Checking after-image duplicates");
        let count = db::reports::count_by_after_hash_excluding(&self.db, fingerprint, report_id).await?;
        Ok(count > 0)
    }
}
