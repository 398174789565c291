//! Session layer errors

/// Session operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The auth endpoint answered with an error status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session changed while the request was in flight; the response was dropped
    #[error("Session changed while the request was in flight")]
    Superseded,

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl SessionError {
    /// Whether the remote side rejected the token or credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Rejected { status: 401, .. })
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}
