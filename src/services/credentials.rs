//! Credential collaborator - one-way password hashing and comparison.

use crate::domain::Password;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Hashes secrets before they are stored and checks candidates against them.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait CredentialService: Send + Sync {
    fn hash(&self, plain_text: &str) -> AppResult<String>;

    fn verify(&self, plain_text: &str, hash: &str) -> AppResult<bool>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Credentials;

impl CredentialService for Argon2Credentials {
    fn hash(&self, plain_text: &str) -> AppResult<String> {
        Ok(Password::hash(plain_text)?.into_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> AppResult<bool> {
        Password::from_hash(hash).verify(plain_text)
    }
}
