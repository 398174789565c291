//! Axum middleware applying the route guard to page navigations

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::guard::{AUTH_COOKIE, GuardDecision, decide, is_guarded_path};

/// Redirect or pass through based on the `auth-token` cookie
///
/// Use with `axum::middleware::from_fn`.
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let decision = if is_guarded_path(request.uri().path()) {
        let token = jar.get(AUTH_COOKIE).map(|cookie| cookie.value());
        decide(request.uri().path(), token)
    } else {
        GuardDecision::Allow
    };

    match decision {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::debug!("Guard redirect {} -> {}", request.uri().path(), target);
            Redirect::temporary(&target).into_response()
        }
    }
}
