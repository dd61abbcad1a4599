use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use super::repo::RepositoryError;
use crate::rdbms::RdbmsError;

/// Outcome of a user flow as the HTTP layer reports it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("user with given email already exists")]
    EmailTaken,

    #[error("wrong email or password has been given")]
    InvalidCredentials,

    #[error("wrong old password")]
    WrongPassword,

    #[error("user not found")]
    NotFound,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => ApiError::BadRequest(msg.to_string()),
            RepositoryError::Store(RdbmsError::ReadNotFound) => ApiError::NotFound,
            RepositoryError::Store(RdbmsError::Duplicate(_)) => ApiError::EmailTaken,
            RepositoryError::Store(other) => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::EmailTaken => (StatusCode::CONFLICT, "duplicate"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            ApiError::WrongPassword => (StatusCode::UNAUTHORIZED, "wrong_password"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            // already logged where it was raised
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": kind,
                    "message": self.to_string(),
                }
            })),
        )
            .into_response()
    }
}
