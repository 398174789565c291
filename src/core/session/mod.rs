//! Client session layer
//!
//! Holds the token and cached profile between page loads, talks to the auth
//! API through an [`AuthBackend`], and mirrors the token into the
//! `auth-token` cookie the route guard reads.

pub mod backend;
pub mod context;
pub mod error;
#[cfg(feature = "client")]
pub mod http;
pub mod state;
pub mod storage;

pub use backend::AuthBackend;
pub use context::{SessionContext, SessionEvent};
pub use error::SessionError;
#[cfg(feature = "client")]
pub use http::HttpAuthBackend;
pub use state::{SessionState, SessionUser};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
