use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::application_dto::{
        ApplicationListResponse, ApplicationResponse, HasAppliedResponse,
        SubmitApplicationResponse, UpdateApplicationStatusPayload,
    },
    error::{Error, Result},
    middleware::auth::ensure_role,
    models::{offer::OfferStatus, profile::UserRole},
    services::application_service::{ALLOWED_CV_EXTENSIONS, MAX_CV_BYTES},
    services::storage_service::extension_of,
    utils::jwt::Claims,
    AppState,
};

/// Checks an uploaded CV against the extension allow-list and size ceiling.
/// Returns the lowercased extension on success.
fn validate_attachment(filename: &str, len: usize) -> Result<String> {
    let extension = extension_of(filename).ok_or_else(|| {
        Error::BadRequest("CV file must have an extension".to_string())
    })?;
    if !ALLOWED_CV_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::BadRequest(format!(
            "Unsupported CV format '{}'. Allowed: {}",
            extension,
            ALLOWED_CV_EXTENSIONS.join(", ")
        )));
    }
    if len == 0 {
        return Err(Error::BadRequest("CV file is empty".to_string()));
    }
    if len > MAX_CV_BYTES {
        return Err(Error::BadRequest(format!(
            "CV file exceeds the {} MB limit",
            MAX_CV_BYTES / (1024 * 1024)
        )));
    }
    Ok(extension)
}

/// Caller must own the company behind the offer, or be an admin.
async fn ensure_offer_owner(state: &AppState, claims: &Claims, offer_id: Uuid) -> Result<Uuid> {
    let offer = state
        .offer_service
        .get_by_id(offer_id)
        .await?
        .ok_or_else(|| Error::NotFound("Offer not found".to_string()))?;
    if claims.role == UserRole::Admin {
        return Ok(offer.id);
    }
    ensure_role(claims, &[UserRole::Company])?;
    let company = state
        .company_service
        .get_by_id(offer.company_id)
        .await?
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;
    if company.owner_id != claims.sub {
        return Err(Error::Forbidden(
            "You do not own the company for this offer".to_string(),
        ));
    }
    Ok(offer.id)
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}/application-status",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    responses(
        (status = 200, description = "Whether the caller already applied", body = Json<HasAppliedResponse>)
    )
)]
#[axum::debug_handler]
pub async fn application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    ensure_role(&claims, &[UserRole::Student])?;
    let applied = state
        .application_service
        .has_applied(offer_id, claims.sub)
        .await?;
    Ok(Json(HasAppliedResponse { applied }))
}

#[utoipa::path(
    post,
    path = "/api/offers/{id}/applications",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    responses(
        (status = 201, description = "Application submitted", body = Json<SubmitApplicationResponse>),
        (status = 400, description = "Missing or invalid motivation letter or CV"),
        (status = 409, description = "Already applied, or offer no longer open")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(offer_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    ensure_role(&claims, &[UserRole::Student])?;

    let offer = state
        .offer_service
        .get_by_id(offer_id)
        .await?
        .ok_or_else(|| Error::NotFound("Offer not found".to_string()))?;
    if offer.status != OfferStatus::Available {
        return Err(Error::Conflict(
            "This offer is no longer accepting applications".to_string(),
        ));
    }
    if state
        .application_service
        .has_applied(offer_id, claims.sub)
        .await?
    {
        return Err(Error::Conflict(
            "You have already applied to this offer".to_string(),
        ));
    }

    let mut motivation_letter: Option<String> = None;
    let mut cv: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("motivation") => {
                motivation_letter = Some(field.text().await?);
            }
            Some("cv") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| Error::BadRequest("CV file has no name".to_string()))?;
                let data = field.bytes().await?;
                cv = Some((filename, data));
            }
            _ => continue,
        }
    }

    let motivation_letter = motivation_letter
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("Motivation letter is required".to_string()))?;
    let (filename, data) =
        cv.ok_or_else(|| Error::BadRequest("CV file is required".to_string()))?;
    let extension = validate_attachment(&filename, data.len())?;

    let application = state
        .application_service
        .submit(claims.sub, offer_id, motivation_letter, &extension, &data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitApplicationResponse {
            success: true,
            application: ApplicationResponse::from(application),
        }),
    ))
}

#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    ensure_role(&claims, &[UserRole::Student])?;
    let items = state
        .application_service
        .list_for_student(claims.sub)
        .await?;
    Ok(Json(ApplicationListResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[axum::debug_handler]
pub async fn offer_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    ensure_offer_owner(&state, &claims, offer_id).await?;
    let items = state.application_service.list_for_offer(offer_id).await?;
    Ok(Json(ApplicationListResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationStatusPayload,
    responses(
        (status = 200, description = "Status updated", body = Json<ApplicationResponse>),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
    ensure_offer_owner(&state, &claims, application.offer_id).await?;
    let application = state
        .application_service
        .set_status(id, payload.status)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions() {
        for name in ["cv.pdf", "cv.PDF", "resume.doc", "resume.docx"] {
            assert!(validate_attachment(name, 1024).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_missing_or_disallowed_extension() {
        assert!(validate_attachment("cv", 1024).is_err());
        assert!(validate_attachment("cv.exe", 1024).is_err());
        assert!(validate_attachment("cv.txt", 1024).is_err());
    }

    #[test]
    fn rejects_empty_file() {
        assert!(validate_attachment("cv.pdf", 0).is_err());
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        assert!(validate_attachment("cv.pdf", MAX_CV_BYTES).is_ok());
        assert!(validate_attachment("cv.pdf", MAX_CV_BYTES + 1).is_err());
    }
}
