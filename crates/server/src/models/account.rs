//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{AccountId, Email, Role};

/// A registered account (domain type).
///
/// The password hash is intentionally not part of this type; it only
/// surfaces from the credential store on the login path.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// The account's email address - unique across the store.
    pub email: Email,
    /// Display name shown in the UI; the only field the owner may update.
    pub display_name: String,
    /// Current role. Defaults to `user`; never client-settable.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The account fields exposed over the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: AccountId,
    pub email: Email,
    pub display_name: String,
    pub role: Role,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
            role: account.role,
        }
    }
}

/// The authenticated caller, attached to a request by the auth middleware.
///
/// `role` carries the token claim after plain authentication; the admin
/// gate replaces it with the role currently stored for the account.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: AccountId,
    pub email: Email,
    pub role: Role,
}
