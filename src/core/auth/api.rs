//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/register - Register a new user
//! - POST /api/login - Login and get a session token
//! - GET /api/me - Get current user info (CORS enabled)
//! - GET /api/test-profile - Fixed demo profile (CORS enabled)

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::jwt::token_fingerprint;
use crate::core::auth::store::UserProfile;
use crate::core::auth::{AuthError, AuthService, LoginRequest, RegisterRequest};

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

impl AuthError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::MissingFields => (StatusCode::BAD_REQUEST, "MISSING_FIELDS"),
            AuthError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::MissingAuthorization => (StatusCode::UNAUTHORIZED, "MISSING_AUTHORIZATION"),
            AuthError::MalformedAuthorization => {
                (StatusCode::UNAUTHORIZED, "MALFORMED_AUTHORIZATION")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            // Duplicate registrations are reported as a bad request, not 409
            AuthError::EmailAlreadyExists => (StatusCode::BAD_REQUEST, "EMAIL_EXISTS"),
            AuthError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AuthError::InternalError(details) => {
                tracing::error!("Internal error: {}", details);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Headers answered on CORS-enabled resources
const CORS_ALLOW_METHODS: &str = "GET, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ),
    ]
}

/// Attach the CORS headers to every response of a CORS-enabled resource,
/// error responses included
async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for (name, value) in cors_headers() {
        headers.insert(name, value);
    }
    response
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    let cors_routes = Router::new()
        .route("/api/me", get(me_handler).options(preflight_handler))
        .route(
            "/api/test-profile",
            get(test_profile_handler).options(preflight_handler),
        )
        .layer(middleware::map_response(add_cors_headers));

    Router::new()
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .merge(cors_routes)
        .with_state(state)
}

/// POST /api/register
/// Register a new user
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::MalformedBody(e.body_text()))?;

    tracing::info!(
        "Registration attempt for email: {}",
        request.email.as_deref().unwrap_or_default()
    );

    let user = state.auth_service.register(request).await?;

    tracing::info!("User registered successfully: {} (id {})", user.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

/// POST /api/login
/// Login and get a session token
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::MalformedBody(e.body_text()))?;

    tracing::info!(
        "Login attempt for email: {}",
        request.email.as_deref().unwrap_or_default()
    );

    let issued = state.auth_service.login(request).await?;

    tracing::info!(
        "User logged in successfully, token {}",
        token_fingerprint(&issued.token)
    );

    Ok(Json(LoginResponse {
        token: issued.token,
    }))
}

/// GET /api/me
/// Get current user info from the session token
async fn me_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, AuthError> {
    let token = extract_bearer_token(&headers)?;

    tracing::debug!("Profile request with token {}", token_fingerprint(token));

    let user = state.auth_service.current_user(token).await?;

    Ok(Json(user))
}

/// GET /api/test-profile
/// Fixed profile for exercising the UI without logging in
async fn test_profile_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": "1",
        "email": "test@example.com",
        "registrationDate": "2024-01-15T12:00:00Z",
        "subscriptions": ["Basic Plan", "Premium Content"],
    }))
}

/// OPTIONS on CORS-enabled resources
async fn preflight_handler() -> impl IntoResponse {
    (StatusCode::OK, cors_headers(), Json(serde_json::json!({})))
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorization)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedAuthorization);
    }

    Ok(token)
}
