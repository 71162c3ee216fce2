//! Registration and login handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::AccountSummary;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the bearer token plus the account summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub account: AccountSummary,
}

/// Create a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountSummary>)> {
    let account = state
        .auth()
        .register(&request.email, &request.display_name, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (token, account) = state.auth().login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token,
        account: account.into(),
    }))
}
