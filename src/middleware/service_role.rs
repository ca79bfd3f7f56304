use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;

pub const SERVICE_ROLE_HEADER: &str = "x-service-role-key";

/// Gate for the privileged administrative flow (company deletion with
/// cascades). The key is compared in constant time and must never be
/// shipped to browser clients.
pub async fn require_service_role(req: Request, next: Next) -> Response {
    let Some(provided) = req
        .headers()
        .get(SERVICE_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_service_role_key"})),
        )
            .into_response();
    };

    let expected = &crate::config::get_config().service_role_key;
    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_service_role_key"})),
        )
            .into_response()
    }
}
