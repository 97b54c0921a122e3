use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use chrono::Utc;

use crate::{
    application::usecases::{payment_history::PaymentHistoryUseCase, subscriptions::UseCaseResult},
    domain::value_objects::payments::{PaymentHistoryQuery, PaymentHistoryReport},
    infrastructure::axum_http::{auth::AuthAccount, extractors::QueryParams},
};

pub fn routes(payment_history_usecase: Arc<PaymentHistoryUseCase>) -> Router {
    Router::new()
        .route("/history", get(history))
        .with_state(payment_history_usecase)
}

pub async fn history(
    State(payment_history_usecase): State<Arc<PaymentHistoryUseCase>>,
    auth: AuthAccount,
    QueryParams(query): QueryParams<PaymentHistoryQuery>,
) -> UseCaseResult<Json<PaymentHistoryReport>> {
    let report = payment_history_usecase
        .history(auth.account_id, query.months, Utc::now())
        .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::repositories::{
            accounts::MockAccountRepository, payments::MockPaymentLedgerRepository,
        },
        infrastructure::axum_http::auth::{AccessClaims, JwtVerifier},
    };
    use axum::{
        Extension,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "supersecretjwtsecretforunittesting123";

    #[tokio::test]
    async fn unparseable_months_is_a_structured_invalid_request() {
        let usecase = PaymentHistoryUseCase::new(
            Arc::new(MockAccountRepository::new()),
            Arc::new(MockPaymentLedgerRepository::new()),
        );
        let app = routes(Arc::new(usecase)).layer(Extension(Arc::new(JwtVerifier::new(SECRET))));

        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            exp: 9999999999,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let request = Request::builder()
            .uri("/history?months=abc")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }
}
