//! Password storage
//!
//! New credentials are stored as Argon2 PHC strings. Rows written by older
//! deployments hold the password verbatim; those are still accepted, compared
//! in constant time, and flagged so the caller can re-hash them.

use crate::config::PasswordPolicy;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hash error: {0}")]
    Hash(String),
}

/// Outcome of checking a supplied password against the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Matched a verbatim (unhashed) stored value
    LegacyMatch,
    Mismatch,
}

impl Verification {
    pub fn is_match(self) -> bool {
        !matches!(self, Verification::Mismatch)
    }
}

/// Hash a password with Argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Value to write into the `password` column under `policy`
pub fn hash_for_storage(password: &str, policy: PasswordPolicy) -> Result<String, PasswordError> {
    match policy {
        PasswordPolicy::Argon2 => hash_password(password),
        PasswordPolicy::Plaintext => Ok(password.to_string()),
    }
}

/// Whether a stored value is an Argon2 PHC string
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

/// Check `password` against a stored value of either format
pub fn verify_password(password: &str, stored: &str) -> Verification {
    if is_hashed(stored) {
        let Ok(hash) = PasswordHash::new(stored) else {
            tracing::warn!("Stored password hash is malformed");
            return Verification::Mismatch;
        };
        return if Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
        {
            Verification::Match
        } else {
            Verification::Mismatch
        };
    }

    if constant_time_eq(password.as_bytes(), stored.as_bytes()) {
        Verification::LegacyMatch
    } else {
        Verification::Mismatch
    }
}

/// Compare SHA-256 digests so neither content nor length leaks through timing
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let hash_a = Sha256::digest(a);
    let hash_b = Sha256::digest(b);
    hash_a.ct_eq(&hash_b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password1").unwrap();
        assert!(is_hashed(&hash));
        assert_ne!(hash, "password1");
        assert!(hash.len() <= 200, "must fit password VARCHAR(200)");

        assert_eq!(verify_password("password1", &hash), Verification::Match);
        assert_eq!(verify_password("password2", &hash), Verification::Mismatch);
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_legacy_plaintext_rows() {
        assert_eq!(verify_password("password1", "password1"), Verification::LegacyMatch);
        assert_eq!(verify_password("password1", "password"), Verification::Mismatch);
        assert_eq!(verify_password("", "x"), Verification::Mismatch);
        assert!(Verification::LegacyMatch.is_match());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert_eq!(verify_password("x", "$argon2id$garbage"), Verification::Mismatch);
    }

    #[test]
    fn test_storage_policy() {
        assert_eq!(
            hash_for_storage("password1", PasswordPolicy::Plaintext).unwrap(),
            "password1"
        );
        assert!(is_hashed(&hash_for_storage("password1", PasswordPolicy::Argon2).unwrap()));
    }
}
