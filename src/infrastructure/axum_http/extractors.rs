use axum::{
    Json,
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::application::usecases::subscriptions::SubscriptionError;

/// `Json<T>` whose rejection is an `INVALID_REQUEST` error body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SubscriptionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let reason = rejection.body_text();
                warn!(status = %rejection.status(), %reason, "http: request body rejected");
                Err(SubscriptionError::InvalidRequest(reason))
            }
        }
    }
}

/// `Query<T>` whose rejection is an `INVALID_REQUEST` error body.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SubscriptionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => {
                let reason = rejection.body_text();
                warn!(status = %rejection.status(), %reason, "http: query string rejected");
                Err(SubscriptionError::InvalidRequest(reason))
            }
        }
    }
}
