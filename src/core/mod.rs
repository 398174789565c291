//! Core logic of the session gate
//!
//! Server-side pieces (`auth`, `config`, `guard_layer`) are compiled with the
//! `ssr` feature. The route guard decisions and the client session layer are
//! always available.

#[cfg(feature = "ssr")]
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
pub mod guard;
#[cfg(feature = "ssr")]
pub mod guard_layer;
pub mod session;

pub use guard::{GuardDecision, Locale, RouteClass};
