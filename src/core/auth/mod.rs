//! Authentication module
//!
//! This module provides the server side of the session gate:
//! - JWT session token issuance and verification
//! - User store with pluggable credential verification
//! - User registration, login and current-user lookup
//! - REST API endpoints for auth operations

pub mod api;
pub mod credentials;
pub mod jwt;
pub mod service;
pub mod store;

pub use api::{AuthApiState, auth_api_router};
pub use credentials::{
    BcryptVerifier, CredentialError, CredentialVerifier, PasswordHashing, PlaintextVerifier,
};
pub use jwt::{Claims, IssuedToken, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthService, LoginRequest, RegisterRequest};
pub use store::{UserProfile, UserRecord, UserRepository, UserRepositoryError};
