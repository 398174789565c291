//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.
//! Token settings (`JWT_SECRET`, `JWT_TTL_MINUTES`) are read separately by
//! [`JwtConfig::from_env`](crate::core::auth::JwtConfig::from_env).

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use crate::core::auth::credentials::{CredentialVerifier, DEFAULT_BCRYPT_COST, PasswordHashing};

pub const DEFAULT_SITE_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SITE_ROOT: &str = "site";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    /// Example: 0.0.0.0:8080
    pub site_addr: String,

    /// Directory holding the static site (`index.html` is the page shell)
    pub site_root: String,

    /// JSON file persisting registered users; in-memory when unset
    pub users_file: Option<String>,

    /// How user secrets are stored and compared
    pub password_hashing: PasswordHashing,

    /// Work factor when `password_hashing` is bcrypt
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let password_hashing = match get("PASSWORD_HASHING") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using plaintext", e);
                PasswordHashing::Plaintext
            }),
            None => PasswordHashing::default(),
        };

        Self {
            site_addr: get("SITE_ADDR").unwrap_or_else(|| DEFAULT_SITE_ADDR.to_string()),
            site_root: get("SITE_ROOT").unwrap_or_else(|| DEFAULT_SITE_ROOT.to_string()),
            users_file: get("USERS_FILE").filter(|path| !path.is_empty()),
            password_hashing,
            bcrypt_cost: get("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BCRYPT_COST),
        }
    }

    /// Check if users are persisted to a file
    pub fn has_users_file(&self) -> bool {
        self.users_file.is_some()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.site_addr.parse()
    }

    /// Credential verifier for the configured scheme
    pub fn verifier(&self) -> Arc<dyn CredentialVerifier> {
        self.password_hashing.verifier(self.bcrypt_cost)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
