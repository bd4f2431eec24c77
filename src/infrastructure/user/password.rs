//! Credential hashing with Argon2

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// One-way, salted hashing of plaintext secrets
pub trait CredentialHasher: Send + Sync + Debug {
    /// Hash a plaintext secret into a self-describing digest
    fn hash(&self, plaintext: &str) -> Result<String, DomainError>;

    /// Check a plaintext secret against a digest; malformed digests never verify
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash credential: {}", e)))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let digest = hasher.hash("correct horse battery").unwrap();

        assert!(digest.starts_with("$argon2"));
        assert!(!digest.contains("correct horse battery"));
        assert!(hasher.verify("correct horse battery", &digest));
        assert!(!hasher.verify("wrong horse battery", &digest));
    }

    #[test]
    fn test_same_plaintext_gives_distinct_digests() {
        let hasher = Argon2Hasher::new();

        let first = hasher.hash("correct horse battery").unwrap();
        let second = hasher.hash("correct horse battery").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse battery", &first));
        assert!(hasher.verify("correct horse battery", &second));
    }

    #[test]
    fn test_verify_malformed_digest() {
        let hasher = Argon2Hasher::new();

        assert!(!hasher.verify("secret", "not-a-phc-string"));
        assert!(!hasher.verify("secret", ""));
    }
}
