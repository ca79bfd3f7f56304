use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::company_dto::{
        CompanyListResponse, CompanyResponse, CreateCompanyPayload, UpdateCompanyPayload,
    },
    dto::offer_dto::OfferResponse,
    error::{Error, Result},
    middleware::auth::ensure_role,
    models::profile::UserRole,
    utils::jwt::Claims,
    AppState,
};

async fn ensure_owner_or_admin(state: &AppState, claims: &Claims, id: Uuid) -> Result<()> {
    if claims.role == UserRole::Admin {
        return Ok(());
    }
    ensure_role(claims, &[UserRole::Company])?;
    let company = state
        .company_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;
    if company.owner_id != claims.sub {
        return Err(Error::Forbidden(
            "You do not own this company".to_string(),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_companies(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.company_service.list().await?;
    Ok(Json(CompanyListResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let company = state
        .company_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;
    Ok(Json(CompanyResponse::from(company)))
}

/// Offers of one company, all statuses. Used by the company dashboard.
#[axum::debug_handler]
pub async fn company_offers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state.offer_service.list_by_company(id).await?;
    let items: Vec<OfferResponse> = items.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Company created", body = Json<CompanyResponse>),
        (status = 409, description = "Caller already owns a company")
    )
)]
#[axum::debug_handler]
pub async fn create_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_role(&claims, &[UserRole::Company])?;
    // one owner maps to one company by application convention
    if !state
        .company_service
        .get_by_owner(claims.sub)
        .await?
        .is_empty()
    {
        return Err(Error::Conflict(
            "This account already owns a company".to_string(),
        ));
    }
    let company = state.company_service.create(claims.sub, payload).await?;
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

#[axum::debug_handler]
pub async fn update_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_owner_or_admin(&state, &claims, id).await?;
    let company = state.company_service.update(id, payload).await?;
    Ok(Json(CompanyResponse::from(company)))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    responses(
        (status = 204, description = "Company and its unexposed offers deleted"),
        (status = 409, description = "Available offers or applications block deletion")
    )
)]
#[axum::debug_handler]
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    ensure_owner_or_admin(&state, &claims, id).await?;
    state.company_service.delete_cascade(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Service-role variant of company deletion, for the administrative flow
/// that runs without a user session. Same guards apply.
#[axum::debug_handler]
pub async fn delete_company_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.company_service.delete_cascade(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
