use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    application::usecases::subscriptions::{SubscriptionUseCase, UseCaseResult},
    domain::value_objects::subscriptions::SubscriptionSnapshot,
    infrastructure::axum_http::auth::AuthAccount,
};

pub fn routes(subscriptions_usecase: Arc<SubscriptionUseCase>) -> Router {
    Router::new()
        .route("/provision", post(provision))
        .with_state(subscriptions_usecase)
}

/// Called by the identity-provider hook once the account id exists; safe to repeat.
pub async fn provision(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase>>,
    auth: AuthAccount,
) -> UseCaseResult<Json<SubscriptionSnapshot>> {
    Ok(Json(subscriptions_usecase.provision(auth.account_id).await?))
}
