use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::offer_dto::{
        CreateOfferPayload, OfferDetailResponse, OfferListQuery, OfferListResponse, OfferResponse,
        UpdateOfferPayload,
    },
    error::{Error, Result},
    middleware::auth::ensure_role,
    models::profile::UserRole,
    utils::jwt::Claims,
    AppState,
};

/// Company ownership gate for offer mutations. Admins pass unconditionally.
async fn ensure_company_owner(state: &AppState, claims: &Claims, company_id: Uuid) -> Result<()> {
    if claims.role == UserRole::Admin {
        return Ok(());
    }
    ensure_role(claims, &[UserRole::Company])?;
    let company = state
        .company_service
        .get_by_id(company_id)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;
    if company.owner_id != claims.sub {
        return Err(Error::Forbidden(
            "You do not own the company for this offer".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/offers",
    params(
        ("title" = Option<String>, Query, description = "Case-insensitive title substring"),
        ("location" = Option<String>, Query, description = "Case-insensitive location substring"),
        ("sector" = Option<String>, Query, description = "Exact sector, or 'all'"),
        ("page" = Option<i64>, Query, description = "Page number, one-indexed"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Filtered page of available offers", body = Json<OfferListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.offer_service.list(query).await?;
    Ok(Json(OfferListResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    responses(
        (status = 200, description = "Offer with company and contact", body = Json<OfferDetailResponse>),
        (status = 404, description = "Offer not found")
    )
)]
#[axum::debug_handler]
pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state
        .offer_service
        .get_with_company(id)
        .await?
        .ok_or_else(|| Error::NotFound("Offer not found".to_string()))?;
    Ok(Json(OfferDetailResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/offers",
    request_body = CreateOfferPayload,
    responses(
        (status = 201, description = "Offer created", body = Json<OfferResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller does not own the company")
    )
)]
#[axum::debug_handler]
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOfferPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_company_owner(&state, &claims, payload.company_id).await?;
    let offer = state.offer_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(OfferResponse::from(offer))))
}

#[utoipa::path(
    patch,
    path = "/api/offers/{id}",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    request_body = UpdateOfferPayload,
    responses(
        (status = 200, description = "Offer updated", body = Json<OfferResponse>),
        (status = 404, description = "Offer not found")
    )
)]
#[axum::debug_handler]
pub async fn update_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOfferPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let offer = state
        .offer_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound("Offer not found".to_string()))?;
    ensure_company_owner(&state, &claims, offer.company_id).await?;
    let offer = state.offer_service.update(id, payload).await?;
    Ok(Json(OfferResponse::from(offer)))
}

#[utoipa::path(
    delete,
    path = "/api/offers/{id}",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    responses(
        (status = 204, description = "Offer deleted"),
        (status = 404, description = "Offer not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state
        .offer_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound("Offer not found".to_string()))?;
    ensure_company_owner(&state, &claims, offer.company_id).await?;
    state.offer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
