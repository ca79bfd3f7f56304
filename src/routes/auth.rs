use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::get_config,
    dto::auth_dto::{AuthResponse, ProfileResponse, SignInPayload, SignUpPayload},
    error::Result,
    utils::jwt::{issue_token, Claims},
    AppState,
};

#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.auth_service.sign_up(payload).await?;
    let token = issue_token(profile.id, profile.role, &get_config().jwt_secret)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            profile: ProfileResponse::from(profile),
        }),
    ))
}

#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (token, profile) = state
        .auth_service
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(Json(AuthResponse {
        token,
        profile: ProfileResponse::from(profile),
    }))
}

/// Tokens are stateless; signing out is a client-side discard. The
/// endpoint exists for interface symmetry.
#[axum::debug_handler]
pub async fn sign_out(Extension(_claims): Extension<Claims>) -> impl IntoResponse {
    Json(json!({ "success": true }))
}

/// The caller's profile, or `null` when the identity has no profile row.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let profile = state.auth_service.current_user(claims.sub).await?;
    Ok(Json(profile.map(ProfileResponse::from)))
}
