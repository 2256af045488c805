//! Dewordle Error Types
//!
//! Domain-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::conversions::{is_serialization_failure, is_unavailable};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Dewordle-specific result type alias
pub type DewordleResult<T> = Result<T, DewordleError>;

#[derive(Debug, Error)]
pub enum DewordleError {
    /// Malformed score, outcome, name or paging parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Game not found")]
    GameNotFound,

    /// The user has not recorded any result for the game yet
    #[error("No leaderboard entry for this user and game")]
    StandingNotFound,

    #[error("User name already exists")]
    UserNameTaken,

    /// The store aborted the transaction to keep writers serialized.
    /// Retried by the use case; callers should only see `Conflict`.
    #[error("Serialization failure")]
    SerializationFailure,

    /// Serialization failures persisted through the whole retry budget
    #[error("Leaderboard update conflicted {attempts} times, giving up")]
    Conflict { attempts: u32 },

    /// The store is unreachable or exhausted. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DewordleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DewordleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DewordleError::UserNotFound
            | DewordleError::GameNotFound
            | DewordleError::StandingNotFound => StatusCode::NOT_FOUND,
            DewordleError::UserNameTaken
            | DewordleError::SerializationFailure
            | DewordleError::Conflict { .. } => StatusCode::CONFLICT,
            DewordleError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DewordleError::Database(_) | DewordleError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DewordleError::InvalidInput(_) => ErrorKind::BadRequest,
            DewordleError::UserNotFound
            | DewordleError::GameNotFound
            | DewordleError::StandingNotFound => ErrorKind::NotFound,
            DewordleError::UserNameTaken
            | DewordleError::SerializationFailure
            | DewordleError::Conflict { .. } => ErrorKind::Conflict,
            DewordleError::StoreUnavailable(_) => ErrorKind::ServiceUnavailable,
            DewordleError::Database(_) | DewordleError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Store details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            DewordleError::InvalidInput(_) => AppError::bad_request(self.to_string()),
            DewordleError::UserNotFound
            | DewordleError::GameNotFound
            | DewordleError::StandingNotFound => AppError::not_found(self.to_string()),
            DewordleError::UserNameTaken => AppError::conflict(self.to_string()),
            DewordleError::Conflict { .. } | DewordleError::SerializationFailure => {
                AppError::conflict(self.to_string()).with_action("Retry the request")
            }
            DewordleError::StoreUnavailable(_) => {
                AppError::service_unavailable("Store unavailable").with_action("Retry later")
            }
            DewordleError::Database(_) | DewordleError::Internal(_) => {
                AppError::internal("Internal server error")
            }
        }
    }

    fn log(&self) {
        match self {
            DewordleError::Database(e) => {
                tracing::error!(error = %e, "Dewordle database error");
            }
            DewordleError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Dewordle store unavailable");
            }
            DewordleError::Internal(msg) => {
                tracing::error!(message = %msg, "Dewordle internal error");
            }
            DewordleError::Conflict { attempts } => {
                tracing::warn!(attempts = attempts, "Leaderboard update retries exhausted");
            }
            _ => {
                tracing::debug!(error = %self, "Dewordle error");
            }
        }
    }
}

/// Classifies store errors: unreachable stores and serialization aborts get
/// their own variants, everything else is a plain database error.
impl From<sqlx::Error> for DewordleError {
    fn from(err: sqlx::Error) -> Self {
        if is_unavailable(&err) {
            DewordleError::StoreUnavailable(err)
        } else if is_serialization_failure(&err) {
            DewordleError::SerializationFailure
        } else {
            DewordleError::Database(err)
        }
    }
}

// Extractor rejections join the taxonomy so every bad request gets the same
// problem body.
impl From<JsonRejection> for DewordleError {
    fn from(rejection: JsonRejection) -> Self {
        DewordleError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for DewordleError {
    fn from(rejection: QueryRejection) -> Self {
        DewordleError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for DewordleError {
    fn from(rejection: PathRejection) -> Self {
        DewordleError::InvalidInput(rejection.body_text())
    }
}

impl From<DewordleError> for AppError {
    fn from(err: DewordleError) -> Self {
        let app_err = err.to_app_error();
        match err {
            DewordleError::StoreUnavailable(source) | DewordleError::Database(source) => {
                app_err.with_source(source)
            }
            _ => app_err,
        }
    }
}

impl IntoResponse for DewordleError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
