//! Router assembly for the server binary

use std::path::Path;

use axum::{Router, middleware};
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::services::{ServeDir, ServeFile};

use crate::core::auth::{
    AuthApiState, AuthService, JwtService, UserRepository, UserRepositoryError, auth_api_router,
};
use crate::core::config::Config;
use crate::core::guard_layer::route_guard;

impl AuthApiState {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }

    /// Build the user store and token service described by `config`
    pub async fn from_config(
        config: &Config,
        jwt_service: JwtService,
    ) -> Result<Self, UserRepositoryError> {
        let verifier = config.verifier();
        let users = match &config.users_file {
            Some(path) => UserRepository::open(path, verifier).await?,
            None => UserRepository::in_memory(verifier)?,
        };

        tracing::info!(
            "User store ready: {} users, persisted={}, hashing={}",
            users.len().await,
            config.has_users_file(),
            config.password_hashing
        );

        Ok(Self::new(AuthService::new(users, jwt_service)))
    }
}

/// Full application: auth API plus the guarded static site
///
/// Unknown paths under `site_root` fall back to `index.html`, so client-side
/// routes such as `/en/profile` load the page shell once the guard lets them
/// through.
pub fn app_router(state: AuthApiState, site_root: impl AsRef<Path>) -> Router {
    let site_root = site_root.as_ref();
    let site = ServeDir::new(site_root)
        .precompressed_br()
        .precompressed_gzip()
        .fallback(ServeFile::new(site_root.join("index.html")));

    Router::new()
        .merge(auth_api_router(state))
        .fallback_service(site)
        .layer(middleware::from_fn(route_guard))
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Best),
        )
}
