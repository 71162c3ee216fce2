//! Authentication middleware and extractors.
//!
//! Two composable gates, applied in order:
//!
//! 1. [`RequireAuth`] - `Authorization: Bearer <token>` to [`Identity`], or
//!    401. A missing header or missing token segment is reported with a
//!    different message than a bad signature or expiry, so clients can tell
//!    "you forgot the header" apart from "re-login".
//! 2. [`RequireAdmin`] - authentication plus an admin check that re-reads
//!    the credential store for the *current* role. Token role claims can go
//!    stale when an admin is demoted after issuance; re-checking closes
//!    that window. Non-admins get 403.
//!
//! The chain is order-sensitive by construction: `RequireAdmin` performs
//! the authenticate step itself, so authorization can never run without a
//! prior identity.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use orchard_core::{Email, Role};

use crate::auth::token::TokenError;
use crate::error::AppError;
use crate::models::Identity;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
pub struct RequireAuth(pub Identity);

/// Error returned when authentication fails.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization` header on the request.
    MissingHeader,
    /// Header present but no token after the `Bearer` scheme.
    MissingToken,
    /// Correctly signed token past its expiry.
    Expired,
    /// Bad signature, wrong structure, or undecodable claims.
    Invalid,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingHeader => "authorization header missing",
            Self::MissingToken => "bearer token missing",
            Self::Expired => "token expired",
            Self::Invalid => "invalid token",
        };
        AppError::Unauthorized(message.to_owned()).into_response()
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Identity, AuthRejection> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthRejection::MissingHeader)?;

    let value = header.to_str().map_err(|_| AuthRejection::Invalid)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::MissingToken)?;

    let claims = state.tokens().verify(token).map_err(|e| match e {
        TokenError::Expired => AuthRejection::Expired,
        TokenError::Malformed | TokenError::Signing => AuthRejection::Invalid,
    })?;

    let email = Email::parse(&claims.email).map_err(|_| AuthRejection::Invalid)?;

    Ok(Identity {
        account_id: claims.sub,
        email,
        role: claims.role,
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

/// Extractor that requires a valid bearer token AND a current admin role.
///
/// The role is read from the credential store on every request rather than
/// trusted from the token claim.
pub struct RequireAdmin(pub Identity);

/// Error returned when the admin gate rejects a request.
#[derive(Debug)]
pub enum AdminRejection {
    /// Authentication itself failed.
    Auth(AuthRejection),
    /// Authenticated, but the stored role is not admin.
    Forbidden,
    /// The credential store did not answer in time.
    Unavailable,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::Forbidden => {
                AppError::Forbidden("admin role required".to_owned()).into_response()
            }
            Self::Unavailable => {
                AppError::Unavailable("credential store timed out".to_owned()).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state).map_err(AdminRejection::Auth)?;

        // Re-read the store: the token's role claim may be stale.
        let lookup = tokio::time::timeout(
            state.call_timeout(),
            state.accounts().account_by_id(identity.account_id),
        )
        .await
        .map_err(|_| AdminRejection::Unavailable)?;

        let account = match lookup {
            Ok(Some(account)) => account,
            Ok(None) => return Err(AdminRejection::Forbidden),
            Err(e) => {
                tracing::error!(error = %e, "role lookup failed");
                return Err(AdminRejection::Unavailable);
            }
        };

        if account.role != Role::Admin {
            return Err(AdminRejection::Forbidden);
        }

        Ok(Self(Identity {
            role: account.role,
            ..identity
        }))
    }
}
