//! Profile handlers.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::AccountSummary;
use crate::state::AppState;

/// Profile update request body. Only the display name is updatable; role
/// and email changes have no client-facing path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

/// Read the caller's profile.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<AccountSummary>> {
    let account = state.auth().profile(identity.account_id).await?;
    Ok(Json(account.into()))
}

/// Update the caller's display name.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<AccountSummary>> {
    let account = state
        .auth()
        .update_display_name(identity.account_id, &request.display_name)
        .await?;
    Ok(Json(account.into()))
}
