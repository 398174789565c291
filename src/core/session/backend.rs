//! Remote side of the session: the auth endpoints

use std::future::Future;

use super::error::SessionError;
use super::state::SessionUser;

/// Calls the session layer makes against the auth API
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Create an account; returns the server's confirmation message
    fn register(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Fetch the profile the token belongs to
    fn fetch_profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<SessionUser, SessionError>> + Send;
}
