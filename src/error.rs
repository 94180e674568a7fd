//! Crate-wide error type with thiserror, plus the axum response mapping so
//! handlers can return `Result<_>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Resource lookup misses (post ids, mostly).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attempt to track a keyword that is already tracked.
    #[error("Keyword '{0}' already exists")]
    DuplicateKeyword(String),

    /// Database connection or query errors.
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Anything else.
    #[error("Internal error: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateKeyword(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) | Error::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keyword_is_a_bad_request() {
        let resp = Error::DuplicateKeyword("tesla".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = Error::NotFound("post 42 not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
