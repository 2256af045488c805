//! Conversions into [`AppError`] and store error classification

use super::app_error::AppError;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        // A truncated body is as much the client's fault as a malformed one
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

/// PostgreSQL SQLSTATE codes worth distinguishing
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
#[cfg(feature = "sqlx")]
pub mod pg_codes {
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
}

/// SQLSTATE of a database error, if any
#[cfg(feature = "sqlx")]
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Whether retrying the whole transaction may succeed
#[cfg(feature = "sqlx")]
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(
        sqlstate(err).as_deref(),
        Some(pg_codes::SERIALIZATION_FAILURE) | Some(pg_codes::DEADLOCK_DETECTED)
    )
}

/// Whether the store itself is unreachable or exhausted
#[cfg(feature = "sqlx")]
pub fn is_unavailable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(_) => matches!(
            sqlstate(err).as_deref(),
            Some("53000" | "53100" | "53200" | "53300" | "57P01" | "57P02" | "57P03")
        ),
        _ => false,
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 problem details
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}
