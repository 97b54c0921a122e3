use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::usecases::subscriptions::SubscriptionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

pub fn status_code(err: &SubscriptionError) -> StatusCode {
    match err {
        SubscriptionError::NotFound => StatusCode::NOT_FOUND,
        SubscriptionError::Unauthorized => StatusCode::UNAUTHORIZED,
        SubscriptionError::InvalidRequest(_)
        | SubscriptionError::InsufficientQuota
        | SubscriptionError::NotActive
        | SubscriptionError::CannotReactivateExpired => StatusCode::BAD_REQUEST,
        SubscriptionError::OrderConflict
        | SubscriptionError::Conflict
        | SubscriptionError::AlreadyCanceled
        | SubscriptionError::AlreadyActive => StatusCode::CONFLICT,
        SubscriptionError::BillingKeyIssueFailed | SubscriptionError::FirstPaymentFailed => {
            StatusCode::BAD_GATEWAY
        }
        SubscriptionError::DbUpdateFailed | SubscriptionError::DbError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let body = Json(ErrorResponse {
            status: status.as_u16(),
            code: self.code(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Gives the empty 408 written by the timeout layer the same body as every other error.
pub async fn fill_timeout_body(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    let status = StatusCode::REQUEST_TIMEOUT;
    let body = Json(ErrorResponse {
        status: status.as_u16(),
        code: "REQUEST_TIMEOUT",
        message: "request timed out".to_string(),
    });

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: SubscriptionError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn body_carries_status_code_and_message() {
        let (status, body) = render(SubscriptionError::InsufficientQuota).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "INSUFFICIENT_QUOTA");
        assert_eq!(body["message"], "no units left in the current period");
    }

    #[tokio::test]
    async fn maps_failure_classes() {
        assert_eq!(render(SubscriptionError::NotFound).await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            render(SubscriptionError::Unauthorized).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            render(SubscriptionError::AlreadyActive).await.0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            render(SubscriptionError::FirstPaymentFailed).await.0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            render(SubscriptionError::DbUpdateFailed).await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn timeout_responses_get_an_error_body() {
        let response = fill_timeout_body(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["status"], 408);
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let response = fill_timeout_body((StatusCode::OK, "OK").into_response()).await;
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn invalid_request_message_names_the_field() {
        let (_, body) =
            render(SubscriptionError::InvalidRequest("orderId must not be empty".into())).await;

        assert_eq!(body["code"], "INVALID_REQUEST");
        assert_eq!(body["message"], "invalid request: orderId must not be empty");
    }
}
