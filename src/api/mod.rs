/// API routes and handlers
///
/// Each service exposes its own router over its own state. The shared
/// pieces here fold axum's extractor rejections into [`MeshError`] so every
/// rejection carries the structured error body.
pub mod blogs;
pub mod comments;
pub mod gateway;
pub mod health;
pub mod middleware;
pub mod notifications;
pub mod users;

pub use health::ServiceInfo;

use crate::{
    error::{MeshError, MeshResult},
    store::{not_found, Record},
};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// JSON request body whose rejection is a `ValidationError`
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MeshError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(MeshError::Validation(rejection.body_text())),
        }
    }
}

/// Parse a path id. Anything that is not a positive integer cannot name a record.
pub fn parse_id<T: Record>(raw: &str) -> MeshResult<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(not_found::<T>)
}

/// `{"message": ...}` body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// `{"message": ..., "count": n}` body for bulk operations
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub message: String,
    pub count: usize,
}
