//! Account roles.

use serde::{Deserialize, Serialize};

/// The role attached to an account.
///
/// Every account is created as [`Role::User`]; the role is never settable by
/// the account owner. Admin-gated endpoints re-read the stored role rather
/// than trusting a token claim, so revoking `Admin` takes effect on the next
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper. Can manage their own profile and orders.
    #[default]
    User,
    /// Store operator. Can read all orders and drive status transitions.
    Admin,
}

impl Role {
    /// Returns the role name as stored in the credential store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
