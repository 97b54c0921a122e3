use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    application::usecases::{quota::QuotaUseCase, subscriptions::UseCaseResult},
    domain::value_objects::quota::ConsumedUnit,
    infrastructure::axum_http::auth::AuthAccount,
};

pub fn routes(quota_usecase: Arc<QuotaUseCase>) -> Router {
    Router::new()
        .route("/consume", post(consume))
        .with_state(quota_usecase)
}

pub async fn consume(
    State(quota_usecase): State<Arc<QuotaUseCase>>,
    auth: AuthAccount,
) -> UseCaseResult<Json<ConsumedUnit>> {
    Ok(Json(quota_usecase.consume_one(auth.account_id).await?))
}
