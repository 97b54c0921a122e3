use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    application::usecases::subscriptions::{SubscriptionUseCase, UseCaseResult},
    domain::value_objects::subscriptions::{
        AckDto, ConfirmSubscriptionModel, SubscriptionSnapshot,
    },
    infrastructure::axum_http::{auth::AuthAccount, extractors::JsonBody},
};

pub fn routes(subscriptions_usecase: Arc<SubscriptionUseCase>) -> Router {
    Router::new()
        .route("/confirm", post(confirm))
        .route("/cancel", post(cancel))
        .route("/reactivate", post(reactivate))
        .route("/status", get(status))
        .with_state(subscriptions_usecase)
}

pub async fn confirm(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase>>,
    auth: AuthAccount,
    JsonBody(confirm_subscription_model): JsonBody<ConfirmSubscriptionModel>,
) -> UseCaseResult<Json<SubscriptionSnapshot>> {
    let snapshot = subscriptions_usecase
        .confirm(auth.account_id, confirm_subscription_model)
        .await?;

    Ok(Json(snapshot))
}

pub async fn cancel(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase>>,
    auth: AuthAccount,
) -> UseCaseResult<Json<AckDto>> {
    Ok(Json(subscriptions_usecase.cancel(auth.account_id).await?))
}

pub async fn reactivate(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase>>,
    auth: AuthAccount,
) -> UseCaseResult<Json<AckDto>> {
    Ok(Json(subscriptions_usecase.reactivate(auth.account_id).await?))
}

pub async fn status(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase>>,
    auth: AuthAccount,
) -> UseCaseResult<Json<SubscriptionSnapshot>> {
    Ok(Json(subscriptions_usecase.status(auth.account_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::account_locks::AccountLocks,
        config::config_model::Plans,
        domain::repositories::{
            accounts::MockAccountRepository, billing_gateway::MockBillingGateway,
            payments::MockPaymentLedgerRepository,
        },
        infrastructure::axum_http::auth::{AccessClaims, JwtVerifier},
    };
    use axum::{
        Extension,
        body::{Body, to_bytes},
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "supersecretjwtsecretforunittesting123";

    fn app() -> Router {
        // No repository or gateway call is expected to be reached.
        let usecase = SubscriptionUseCase::new(
            Arc::new(MockAccountRepository::new()),
            Arc::new(MockPaymentLedgerRepository::new()),
            Arc::new(MockBillingGateway::new()),
            Arc::new(AccountLocks::new()),
            Plans::default(),
        );

        routes(Arc::new(usecase)).layer(Extension(Arc::new(JwtVerifier::new(SECRET))))
    }

    fn bearer() -> String {
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
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn confirm_with_empty_body_is_a_structured_invalid_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/confirm")
            .header(AUTHORIZATION, bearer())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn confirm_without_token_is_unauthorized_before_the_body_is_read() {
        let request = Request::builder()
            .method("POST")
            .uri("/confirm")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
