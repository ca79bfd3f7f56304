use serde::{Deserialize, Serialize};

use crate::dto::application_dto::ApplicationResponse;
use crate::dto::company_dto::CompanyResponse;
use crate::dto::offer_dto::OfferResponse;

/// Platform-wide counters for the admin view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    pub companies: i64,
    pub students: i64,
    pub offers: i64,
    pub available_offers: i64,
    pub applications: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferWithApplications {
    pub offer: OfferResponse,
    pub application_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub company: CompanyResponse,
    pub offers: Vec<OfferWithApplications>,
}

/// Role-specific dashboard payload. The tag mirrors the caller's role so
/// clients can switch on it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardResponse {
    Admin { stats: PlatformStats },
    Company { companies: Vec<CompanyOverview> },
    Student { applications: Vec<ApplicationResponse> },
}
