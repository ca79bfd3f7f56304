use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::offer_dto::{CreateOfferPayload, OfferListQuery, UpdateOfferPayload};
use crate::error::Result;
use crate::models::company::Company;
use crate::models::offer::{Offer, OfferStatus};
use crate::models::profile::Profile;

/// Sentinel sector value meaning "do not filter by sector".
pub const SECTOR_ALL: &str = "all";

const DEFAULT_PAGE_SIZE: i64 = 10;

const OFFER_COLUMNS: &str =
    "id, company_id, title, description, duration, start_date, end_date, location, sector, \
     status, created_at, updated_at";

#[derive(Clone)]
pub struct OfferService {
    pool: PgPool,
}

pub struct OfferList {
    pub items: Vec<Offer>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// An offer together with its owning company and, when the owner has a
/// profile, the company contact.
pub struct OfferDetail {
    pub offer: Offer,
    pub company: Company,
    pub contact: Option<Profile>,
}

/// Builds the WHERE clause for the public listing. Only `available` offers
/// are ever eligible; trimmed non-empty title/location become ILIKE
/// substring filters and a non-sentinel sector an exact match. All filters
/// compose conjunctively.
fn build_filters(query: &OfferListQuery) -> (String, Vec<String>) {
    let mut clauses = vec!["status = 'available'".to_string()];
    let mut args: Vec<String> = Vec::new();

    if let Some(title) = query
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        clauses.push(format!("title ILIKE ${}", args.len() + 1));
        args.push(format!("%{}%", title));
    }
    if let Some(location) = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        clauses.push(format!("location ILIKE ${}", args.len() + 1));
        args.push(format!("%{}%", location));
    }
    if let Some(sector) = query
        .sector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != SECTOR_ALL)
    {
        clauses.push(format!("sector = ${}", args.len() + 1));
        args.push(sector.to_string());
    }

    (format!("WHERE {}", clauses.join(" AND ")), args)
}

/// Offset pagination: one-indexed page, clamped page size.
fn page_window(query: &OfferListQuery) -> (i64, i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

impl OfferService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, paginated listing of available offers, newest first.
    /// `total` counts the whole filtered set so callers can derive the page
    /// count without a second unfiltered query.
    pub async fn list(&self, query: OfferListQuery) -> Result<OfferList> {
        let (where_clause, args) = build_filters(&query);
        let (page, per_page, offset) = page_window(&query);

        let items_query = format!(
            "SELECT {} FROM offers {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            OFFER_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM offers {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, Offer>(&items_query);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        items_statement = items_statement.bind(per_page).bind(offset);
        let items = items_statement.fetch_all(&self.pool).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(OfferList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE id = $1",
            OFFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(offer)
    }

    /// Offer detail eagerly including the owning company and the owner's
    /// contact profile. `None` when the offer does not exist.
    pub async fn get_with_company(&self, id: Uuid) -> Result<Option<OfferDetail>> {
        let Some(offer) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let company = sqlx::query_as::<_, Company>(
            "SELECT id, owner_id, name, address, sector, created_at, updated_at \
             FROM companies WHERE id = $1",
        )
        .bind(offer.company_id)
        .fetch_one(&self.pool)
        .await?;

        let contact = sqlx::query_as::<_, Profile>(
            "SELECT id, role, first_name, last_name, created_at, updated_at \
             FROM profiles WHERE id = $1",
        )
        .bind(company.owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(OfferDetail {
            offer,
            company,
            contact,
        }))
    }

    pub async fn create(&self, payload: CreateOfferPayload) -> Result<Offer> {
        let status = payload.status.unwrap_or(OfferStatus::Available);
        let offer = sqlx::query_as::<_, Offer>(&format!(
            "INSERT INTO offers \
             (company_id, title, description, duration, start_date, end_date, location, sector, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {}",
            OFFER_COLUMNS
        ))
        .bind(payload.company_id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.duration)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.location)
        .bind(payload.sector)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(offer)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateOfferPayload) -> Result<Offer> {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            "UPDATE offers SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                duration = COALESCE($4, duration), \
                start_date = COALESCE($5, start_date), \
                end_date = COALESCE($6, end_date), \
                location = COALESCE($7, location), \
                sector = COALESCE($8, sector), \
                status = COALESCE($9, status), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            OFFER_COLUMNS
        ))
        .bind(id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.duration)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.location)
        .bind(payload.sector)
        .bind(payload.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(offer)
    }

    /// Pass-through deletion. Invariant checks (exposure, applications)
    /// belong to the caller.
    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Offer>> {
        let items = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE company_id = $1 ORDER BY created_at DESC",
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM offers")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_by_status(&self, status: OfferStatus) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM offers WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
