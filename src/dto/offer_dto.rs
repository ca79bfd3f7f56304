use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::ContactResponse;
use crate::dto::company_dto::CompanyResponse;
use crate::models::offer::{Offer, OfferStatus};
use crate::services::offer_service::{OfferDetail, OfferList};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOfferPayload {
    pub company_id: Uuid,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub duration: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(length(min = 1))]
    pub sector: String,
    pub status: Option<OfferStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOfferPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub duration: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub sector: Option<String>,
    pub status: Option<OfferStatus>,
}

/// Listing filters. `title` and `location` are trimmed, case-insensitive
/// substring matches; `sector` is an exact match unless it is the sentinel
/// `"all"`. Filters compose conjunctively.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OfferListQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    pub sector: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub sector: String,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferListResponse {
    pub items: Vec<OfferResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDetailResponse {
    pub offer: OfferResponse,
    pub company: CompanyResponse,
    pub contact: Option<ContactResponse>,
}

impl From<Offer> for OfferResponse {
    fn from(value: Offer) -> Self {
        Self {
            id: value.id,
            company_id: value.company_id,
            title: value.title,
            description: value.description,
            duration: value.duration,
            start_date: value.start_date,
            end_date: value.end_date,
            location: value.location,
            sector: value.sector,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<OfferList> for OfferListResponse {
    fn from(value: OfferList) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}

impl From<OfferDetail> for OfferDetailResponse {
    fn from(value: OfferDetail) -> Self {
        Self {
            offer: value.offer.into(),
            company: value.company.into(),
            contact: value.contact.map(Into::into),
        }
    }
}
