use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::company_dto::{CreateCompanyPayload, UpdateCompanyPayload};
use crate::error::{Error, Result};
use crate::models::company::Company;

const COMPANY_COLUMNS: &str = "id, owner_id, name, address, sector, created_at, updated_at";

/// Deletion guard: a company with exposed offers or received applications
/// must not be removed. Errors carry the blocking count so the caller can
/// tell the user what stands in the way.
fn deletion_blockers(available_offers: i64, applications: i64) -> Result<()> {
    if available_offers > 0 {
        return Err(Error::Conflict(format!(
            "Company has {} available offer(s); expire or fill them before deleting",
            available_offers
        )));
    }
    if applications > 0 {
        return Err(Error::Conflict(format!(
            "Company offers have {} application(s); deletion is blocked",
            applications
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CompanyService {
    pool: PgPool,
}

impl CompanyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Company>> {
        let items = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies ORDER BY name ASC",
            COMPANY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    /// One owner maps to one company by application convention; the query
    /// still returns all rows so a violated convention stays visible.
    pub async fn get_by_owner(&self, owner_id: Uuid) -> Result<Vec<Company>> {
        let items = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE owner_id = $1",
            COMPANY_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn create(&self, owner_id: Uuid, payload: CreateCompanyPayload) -> Result<Company> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (owner_id, name, address, sector) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COMPANY_COLUMNS
        ))
        .bind(owner_id)
        .bind(payload.name)
        .bind(payload.address)
        .bind(payload.sector)
        .fetch_one(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateCompanyPayload) -> Result<Company> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "UPDATE companies SET \
                name = COALESCE($2, name), \
                address = COALESCE($3, address), \
                sector = COALESCE($4, sector), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .bind(payload.name)
        .bind(payload.address)
        .bind(payload.sector)
        .fetch_one(&self.pool)
        .await?;
        Ok(company)
    }

    /// Guarded cascade: rejects while any offer is still `available`, then
    /// while any application exists on the company's offers; otherwise
    /// deletes offers and company in one transaction.
    pub async fn delete_cascade(&self, id: Uuid) -> Result<()> {
        let available_offers = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM offers WHERE company_id = $1 AND status = 'available'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let applications = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM applications a \
             JOIN offers o ON o.id = a.offer_id \
             WHERE o.company_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        deletion_blockers(available_offers, applications)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM offers WHERE company_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound("Company not found".to_string()));
        }
        tx.commit().await?;

        tracing::info!(company_id = %id, "company deleted with its unexposed offers");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
