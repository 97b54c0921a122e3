use axum::{Json, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::infrastructure::axum_http::error_responses::ErrorResponse;

pub async fn not_found() -> impl IntoResponse {
    debug!("router: no route matched");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            status: StatusCode::NOT_FOUND.as_u16(),
            code: "ROUTE_NOT_FOUND",
            message: "route not found".to_string(),
        }),
    )
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
