use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::models::profile::UserRole;
use crate::utils::jwt::{decode_token, Claims};

fn bearer_token(req: &Request) -> Result<&str, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response());
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response());
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response());
    };
    Ok(token)
}

/// Decodes the bearer token and stashes the claims for handlers.
pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token.to_string(),
        Err(resp) => return resp,
    };

    let config = crate::config::get_config();
    match decode_token(&token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}

/// Role check for handlers that already run behind `require_bearer_auth`.
pub fn ensure_role(claims: &Claims, allowed: &[UserRole]) -> crate::error::Result<()> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(crate::error::Error::Forbidden(format!(
            "This action requires one of the following roles: {}",
            allowed
                .iter()
                .map(UserRole::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}
