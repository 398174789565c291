//! JWT utilities for session token issuance and verification
//!
//! Tokens are signed with HS256 over a shared secret and carry only the
//! subject (user id), issue time, expiry and a unique token id.
//! Session tokens live for 2 hours and are never refreshed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Default session token lifetime (2 hours)
const TOKEN_TTL_MINUTES: i64 = 120;

/// Longest lifetime accepted from the environment (one year)
const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Shared secret used when `JWT_SECRET` is not set.
///
/// Only acceptable for the demo deployment; anything real must provide its own key.
pub const DEMO_SECRET: &str = "test-secret-key";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in minutes
    pub ttl_minutes: i64,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_minutes: TOKEN_TTL_MINUTES,
        }
    }

    /// Create config from environment variables
    ///
    /// Falls back to [`DEMO_SECRET`] when `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, signing tokens with the demo secret");
                DEMO_SECRET.to_string()
            }
        };

        let ttl_minutes = parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref());

        Self {
            secret,
            ttl_minutes,
        }
    }

    /// Set token lifetime
    pub fn ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_minutes = minutes;
        self
    }
}

/// Token lifetime from a raw setting; anything outside `1..=MAX_TTL_MINUTES`
/// falls back to the default
fn parse_ttl_minutes(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return TOKEN_TTL_MINUTES;
    };
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_TTL_MINUTES).contains(&minutes) => minutes,
        _ => {
            tracing::warn!(
                "Ignoring JWT_TTL_MINUTES={:?}, using {} minutes",
                raw,
                TOKEN_TTL_MINUTES
            );
            TOKEN_TTL_MINUTES
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::new(DEMO_SECRET)
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// A freshly signed session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    /// Expiration (Unix timestamp)
    pub expires_at: i64,
}

/// Short, non-reversible token identifier for logs
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create JWT service from environment variables
    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }

    /// Issue a session token for `subject` valid from now
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a session token for `subject` as if the clock read `issued_at`
    pub fn issue_at(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let exp = Duration::try_minutes(self.config.ttl_minutes)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| JwtError::EncodingError("token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: exp.timestamp(),
        })
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token's signature and structure, then its expiry against `now`
    ///
    /// A token is rejected once `now >= exp`; there is no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        // Expiry is checked below against the caller's clock
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}
