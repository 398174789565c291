//! Authentication service
//!
//! Business logic behind the auth endpoints: registration, login and
//! resolving the current user from a session token.
//! Coordinates between the user store and the JWT service.

use serde::{Deserialize, Serialize};

use crate::core::auth::jwt::{IssuedToken, JwtError, JwtService, token_fingerprint};
use crate::core::auth::store::{UserProfile, UserRecord, UserRepository, UserRepositoryError};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authorization header is missing")]
    MissingAuthorization,

    #[error("Authorization header must start with \"Bearer \"")]
    MalformedAuthorization,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("User with this email already exists")]
    EmailAlreadyExists,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::InvalidToken | JwtError::DecodingError(_) => AuthError::InvalidToken,
            JwtError::EncodingError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

/// Registration request data
///
/// Fields are optional so that a missing field is reported as a validation
/// error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sent by the registration form; not checked server-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}

/// Login request data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Both credentials, or `MissingFields` if either is absent or empty
fn require_credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> Result<(&'a str, &'a str), AuthError> {
    match (email.as_deref(), password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AuthError::MissingFields),
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(user_repo: UserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AuthError> {
        let (email, password) = require_credentials(&request.email, &request.password)?;

        let user = self.user_repo.insert(email, password).await?;

        Ok(user)
    }

    /// Login an existing user and issue a session token
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedToken, AuthError> {
        let (email, password) = require_credentials(&request.email, &request.password)?;

        let user = self
            .user_repo
            .find_by_credentials(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.jwt_service.issue(&user.id)?;

        Ok(token)
    }

    /// Get the user a session token was issued for
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.jwt_service.verify(token).inspect_err(|e| {
            tracing::debug!("Token {} rejected: {}", token_fingerprint(token), e);
        })?;

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// The underlying user store
    pub fn users(&self) -> &UserRepository {
        &self.user_repo
    }

    /// The underlying token service
    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }
}
