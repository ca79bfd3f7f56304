use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::dashboard_dto::{
        CompanyOverview, DashboardResponse, OfferWithApplications, PlatformStats,
    },
    error::Result,
    models::{offer::OfferStatus, profile::UserRole},
    utils::jwt::Claims,
    AppState,
};

/// One endpoint, three shapes: the payload follows the caller's role.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Role-specific dashboard", body = Json<DashboardResponse>)
    )
)]
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let response = match claims.role {
        UserRole::Admin => {
            let stats = PlatformStats {
                companies: state.company_service.count().await?,
                students: state.auth_service.count_students().await?,
                offers: state.offer_service.count_all().await?,
                available_offers: state
                    .offer_service
                    .count_by_status(OfferStatus::Available)
                    .await?,
                applications: state.application_service.count().await?,
            };
            DashboardResponse::Admin { stats }
        }
        UserRole::Company => {
            let mut companies = Vec::new();
            for company in state.company_service.get_by_owner(claims.sub).await? {
                let mut offers = Vec::new();
                for offer in state.offer_service.list_by_company(company.id).await? {
                    let application_count =
                        state.application_service.count_for_offer(offer.id).await?;
                    offers.push(OfferWithApplications {
                        offer: offer.into(),
                        application_count,
                    });
                }
                companies.push(CompanyOverview {
                    company: company.into(),
                    offers,
                });
            }
            DashboardResponse::Company { companies }
        }
        UserRole::Student => {
            let applications = state
                .application_service
                .list_for_student(claims.sub)
                .await?;
            DashboardResponse::Student {
                applications: applications.into_iter().map(Into::into).collect(),
            }
        }
    };
    Ok(Json(response))
}
