/**
 * Request Extractors
 *
 * Wrappers around axum's `Json`, `Path` and `Query` extractors that reject
 * with [`BackendError`] instead of axum's plain-text rejections. Malformed
 * input therefore gets the same JSON error body as every other failure,
 * with a fixed message; the parser's own text only goes to the debug log.
 */

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;

use crate::backend::error::BackendError;

pub const INVALID_BODY: &str = "Request body contains an invalid or unknown value";
pub const MALFORMED_JSON: &str = "Request body is not valid JSON";
pub const EXPECTED_JSON: &str = "Expected a JSON request body";
pub const INVALID_PATH: &str = "Malformed path parameter";
pub const INVALID_QUERY: &str = "Malformed query string";

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Path parameters
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        match rejection {
            JsonRejection::JsonDataError(_) => {
                BackendError::handler(StatusCode::BAD_REQUEST, INVALID_BODY)
            }
            JsonRejection::MissingJsonContentType(_) => {
                BackendError::handler(StatusCode::UNSUPPORTED_MEDIA_TYPE, EXPECTED_JSON)
            }
            _ => BackendError::handler(StatusCode::BAD_REQUEST, MALFORMED_JSON),
        }
    }
}

impl From<PathRejection> for BackendError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected path parameters");
        BackendError::handler(StatusCode::BAD_REQUEST, INVALID_PATH)
    }
}

impl From<QueryRejection> for BackendError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected query string");
        BackendError::handler(StatusCode::BAD_REQUEST, INVALID_QUERY)
    }
}
