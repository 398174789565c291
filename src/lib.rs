//! Sessiongate - authentication and session gate
//!
//! Credential store, HS256 session tokens, a client session store and a
//! locale-aware route guard, served over a small JSON API with axum.

#[cfg(feature = "ssr")]
pub mod app;
pub mod core;
