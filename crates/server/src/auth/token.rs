//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs over a server-side symmetric secret. The signature
//! covers the full claim set, so tampering with any claim invalidates the
//! token. Nothing is persisted server-side: a token is valid until its
//! expiry, and there is no revocation list - compromise requires rotating
//! the secret, which invalidates all outstanding tokens at once.
//!
//! A missing or weak secret is rejected at startup by configuration
//! loading, never per-request.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use orchard_core::{AccountId, Role};

use crate::models::Account;

/// The signed claim set carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID.
    pub sub: AccountId,
    /// Account email at issuance.
    pub email: String,
    /// Role at issuance. Admin gates re-read the store instead of trusting
    /// this claim.
    pub role: Role,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Token verification failures.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token's expiry timestamp has passed.
    #[error("token expired")]
    Expired,

    /// Wrong structure, wrong signature, or undecodable claims.
    #[error("malformed token")]
    Malformed,

    /// The token could not be signed.
    #[error("token signing failed")]
    Signing,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the shared secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default 60s leeway would let just-expired
        // tokens through.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Issue a token for `account`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, account: &Account) -> Result<String, TokenError> {
        self.issue_with_ttl(account, self.ttl)
    }

    fn issue_with_ttl(&self, account: &Account, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            email: account.email.to_string(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        tracing::debug!(account_id = %account.id, ttl_secs = ttl.num_seconds(), "issuing token");

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Signing)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for a correctly signed token past its
    /// TTL, `TokenError::Malformed` for anything else.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orchard_core::Email;

    use super::*;

    fn service() -> TokenService {
        let secret = SecretString::from("kD8#mQ2$vN5@pL9!wR4&xT7*yB3^zH6%");
        TokenService::new(&secret, Duration::hours(24))
    }

    fn account() -> Account {
        Account {
            id: AccountId::generate(),
            email: Email::parse("alice@example.com").unwrap(),
            display_name: "Alice".to_owned(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_within_ttl() {
        let service = service();
        let account = account();

        let token = service.issue(&account).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let service = service();
        let token = service
            .issue_with_ttl(&account(), Duration::seconds(-120))
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let service = service();
        let token = service.issue(&account()).unwrap();

        // Flip one character in the signature segment.
        let sig_start = token.rfind('.').unwrap() + 1;
        let (head, sig) = token.split_at(sig_start);
        let flipped: String = {
            let mut chars: Vec<char> = sig.chars().collect();
            chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
            chars.into_iter().collect()
        };
        let tampered = format!("{head}{flipped}");

        assert!(matches!(
            service.verify(&tampered),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let service = service();
        assert!(matches!(
            service.verify("not.a.token"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(service.verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn other_secret_rejects() {
        let service = service();
        let other = TokenService::new(
            &SecretString::from("qW1!eR5@tY9#uI3$oP7%aS2^dF6&gH0*"),
            Duration::hours(24),
        );

        let token = service.issue(&account()).unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn claims_cover_role() {
        let service = service();
        let mut admin = account();
        admin.role = Role::Admin;

        let token = service.issue(&admin).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }
}
