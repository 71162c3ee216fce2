//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings: the salt and work-factor parameters are embedded
//! in the output, so verification is self-describing and old hashes keep
//! verifying after the configured cost changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

/// Errors from the hashing step itself.
///
/// Verification never errors: a malformed record simply fails to verify.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed")]
pub struct HashError;

/// Argon2id hasher with a tunable work factor.
pub struct PasswordHasher {
    argon: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the given memory cost (KiB) and time cost.
    ///
    /// Higher costs intentionally slow brute-force attacks; the values come
    /// from configuration so operators can raise them over time.
    ///
    /// # Errors
    ///
    /// Returns `argon2::Error` if the parameters are out of range.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, 1, None)?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password. Non-deterministic: a fresh random salt is generated
    /// per call.
    ///
    /// # Errors
    ///
    /// Returns `HashError` only on internal failure; valid input never
    /// fails.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| HashError)
    }

    /// Verify a password against a stored record.
    ///
    /// The comparison is constant-time. Malformed records return `false`,
    /// never an error.
    #[must_use]
    pub fn verify(&self, plaintext: &str, record: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(record) else {
            return false;
        };
        self.argon
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        // Low-cost parameters to keep tests fast.
        PasswordHasher::new(1024, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let record = hasher.hash("correct horse battery staple").unwrap();
        assert!(hasher.verify("correct horse battery staple", &record));
        assert!(!hasher.verify("wrong password", &record));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same password").unwrap();
        let b = hasher.hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same password", &a));
        assert!(hasher.verify("same password", &b));
    }

    #[test]
    fn record_embeds_algorithm_and_params() {
        let hasher = hasher();
        let record = hasher.hash("pw").unwrap();
        assert!(record.starts_with("$argon2id$"));
        assert!(record.contains("m=1024"));
    }

    #[test]
    fn malformed_record_verifies_false() {
        let hasher = hasher();
        assert!(!hasher.verify("pw", "not a phc string"));
        assert!(!hasher.verify("pw", ""));
        assert!(!hasher.verify("pw", "$argon2id$garbage"));
    }
}
