use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus};
use crate::services::storage_service::StorageService;

/// Attachment ceiling enforced before any upload happens.
pub const MAX_CV_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_CV_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

const APPLICATION_COLUMNS: &str =
    "id, student_id, offer_id, applied_at, status, motivation_letter, cv_path, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub student_id: Uuid,
    pub offer_id: Uuid,
    pub motivation_letter: String,
    pub cv_path: String,
}

/// Narrow capability over application rows. The intake saga only sees this
/// interface, so the compensating-deletion path is testable without a
/// database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRecords: Send + Sync {
    async fn exists(&self, offer_id: Uuid, student_id: Uuid) -> Result<bool>;
    async fn get(&self, id: Uuid) -> Result<Option<Application>>;
    async fn insert(&self, new: NewApplication) -> Result<Application>;
    async fn for_student(&self, student_id: Uuid) -> Result<Vec<Application>>;
    async fn for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>>;
    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Application>;
    async fn count(&self) -> Result<i64>;
    async fn count_for_offer(&self, offer_id: Uuid) -> Result<i64>;
}

pub struct PgApplicationRecords {
    pool: PgPool,
}

impl PgApplicationRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRecords for PgApplicationRecords {
    async fn exists(&self, offer_id: Uuid, student_id: Uuid) -> Result<bool> {
        let row = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM applications WHERE offer_id = $1 AND student_id = $2",
        )
        .bind(offer_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn insert(&self, new: NewApplication) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "INSERT INTO applications (student_id, offer_id, motivation_letter, cv_path, status) \
             VALUES ($1, $2, $3, $4, 'pending') \
             RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(new.student_id)
        .bind(new.offer_id)
        .bind(new.motivation_letter)
        .bind(new.cv_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    async fn for_student(&self, student_id: Uuid) -> Result<Vec<Application>> {
        let items = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE student_id = $1 ORDER BY applied_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>> {
        let items = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE offer_id = $1 ORDER BY applied_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    async fn count(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn count_for_offer(&self, offer_id: Uuid) -> Result<i64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications WHERE offer_id = $1")
                .bind(offer_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }
}

#[derive(Clone)]
pub struct ApplicationService {
    records: Arc<dyn ApplicationRecords>,
    storage: StorageService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, storage: StorageService) -> Self {
        Self {
            records: Arc::new(PgApplicationRecords::new(pool)),
            storage,
        }
    }

    pub fn with_records(records: Arc<dyn ApplicationRecords>, storage: StorageService) -> Self {
        Self { records, storage }
    }

    /// Advisory existence probe. Authoritative only at the read instant;
    /// the unique constraint on (student_id, offer_id) closes the race.
    pub async fn has_applied(&self, offer_id: Uuid, student_id: Uuid) -> Result<bool> {
        self.records.exists(offer_id, student_id).await
    }

    /// Two-phase submission: store the attachment, then insert the row.
    /// If the insert fails the stored object is removed before the error
    /// surfaces, so no orphaned attachment outlives a failed submission.
    /// A crash between the phases can still orphan an object; that is an
    /// accepted limitation of the non-transactional pair of backends.
    pub async fn submit(
        &self,
        student_id: Uuid,
        offer_id: Uuid,
        motivation_letter: String,
        extension: &str,
        data: &[u8],
    ) -> Result<Application> {
        let key = StorageService::key_for(student_id, extension)?;
        self.storage.store(&key, data).await?;

        match self
            .records
            .insert(NewApplication {
                student_id,
                offer_id,
                motivation_letter,
                cv_path: key.clone(),
            })
            .await
        {
            Ok(application) => Ok(application),
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&key).await {
                    tracing::error!(
                        key = %key,
                        error = ?cleanup,
                        "failed to remove attachment after insert failure"
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Application>> {
        self.records.get(id).await
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Application>> {
        self.records.for_student(student_id).await
    }

    pub async fn list_for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>> {
        self.records.for_offer(offer_id).await
    }

    pub async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Application> {
        self.records.set_status(id, status).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.records.count().await
    }

    pub async fn count_for_offer(&self, offer_id: Uuid) -> Result<i64> {
        self.records.count_for_offer(offer_id).await
    }
}
