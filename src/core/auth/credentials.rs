//! Credential verification strategies
//!
//! The user store never compares secrets itself; it asks a [`CredentialVerifier`]
//! to protect a secret before storing it and to check a presented secret
//! against the stored value. The demo deployment stores secrets as-is;
//! `bcrypt` hashing can be switched on without touching callers.

use std::str::FromStr;
use std::sync::Arc;

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Credential verification errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

/// Strategy for storing and comparing user secrets
pub trait CredentialVerifier: Send + Sync {
    /// Value to persist for a freshly supplied secret
    fn protect(&self, secret: &str) -> Result<String, CredentialError>;

    /// Check a presented secret against a stored value
    fn verify(&self, presented: &str, stored: &str) -> Result<bool, CredentialError>;
}

/// Stores secrets verbatim and compares them exactly.
///
/// This is what the demo data expects; it offers no protection at rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn protect(&self, secret: &str) -> Result<String, CredentialError> {
        Ok(secret.to_string())
    }

    fn verify(&self, presented: &str, stored: &str) -> Result<bool, CredentialError> {
        Ok(presented == stored)
    }
}

/// Salted bcrypt hashes
#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl CredentialVerifier for BcryptVerifier {
    fn protect(&self, secret: &str) -> Result<String, CredentialError> {
        bcrypt::hash(secret, self.cost).map_err(|e| CredentialError::HashingError(e.to_string()))
    }

    /// A stored value that is not a bcrypt hash never matches
    fn verify(&self, presented: &str, stored: &str) -> Result<bool, CredentialError> {
        match bcrypt::verify(presented, stored) {
            Ok(matched) => Ok(matched),
            Err(e) => {
                tracing::warn!("Stored secret is not a bcrypt hash: {}", e);
                Ok(false)
            }
        }
    }
}

/// Which verifier the server should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordHashing {
    #[default]
    Plaintext,
    Bcrypt,
}

impl PasswordHashing {
    /// Build the verifier for this scheme
    pub fn verifier(self, bcrypt_cost: u32) -> Arc<dyn CredentialVerifier> {
        match self {
            PasswordHashing::Plaintext => Arc::new(PlaintextVerifier),
            PasswordHashing::Bcrypt => Arc::new(BcryptVerifier::new(bcrypt_cost)),
        }
    }
}

impl std::fmt::Display for PasswordHashing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordHashing::Plaintext => write!(f, "plaintext"),
            PasswordHashing::Bcrypt => write!(f, "bcrypt"),
        }
    }
}

impl FromStr for PasswordHashing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(PasswordHashing::Plaintext),
            "bcrypt" => Ok(PasswordHashing::Bcrypt),
            other => Err(format!("unknown password hashing scheme: {other}")),
        }
    }
}
