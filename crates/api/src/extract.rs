//! Request extractors that reject with the JSON error envelope.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies; these
//! wrappers turn every rejection into `AppError::BadRequest`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON request body.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A numeric record id from the `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<I>(pub I);

impl<S, I> FromRequestParts<S> for IdPath<I>
where
    S: Send + Sync,
    I: From<i32>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("Invalid id".to_string()))?;
        Ok(Self(I::from(raw)))
    }
}

/// Query-string parameters.
#[derive(Debug)]
pub struct Filters<T>(pub T);

impl<S, T> FromRequestParts<S> for Filters<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
