//! HTTP implementation of [`AuthBackend`] over reqwest

use serde::Deserialize;
use serde_json::json;

use super::backend::AuthBackend;
use super::error::SessionError;
use super::state::SessionUser;

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Talks to the auth API at `base_url` (scheme and authority, e.g. `http://127.0.0.1:3000`)
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}

/// Turn a non-success response into [`SessionError::Rejected`]
async fn rejection(response: reqwest::Response) -> SessionError {
    let status = response.status().as_u16();
    let message = match response.json::<MessageBody>().await {
        Ok(body) => body.message,
        Err(_) => format!("Request failed with status {}", status),
    };
    tracing::debug!("Auth API rejected request: {} {}", status, message);
    SessionError::Rejected { status, message }
}

impl AuthBackend for HttpAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<String, SessionError> {
        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json::<TokenBody>().await?.token)
    }

    async fn register(&self, email: &str, password: &str) -> Result<String, SessionError> {
        let response = self
            .client
            .post(self.endpoint("/register"))
            .json(&json!({
                "email": email,
                "password": password,
                "confirmPassword": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json::<MessageBody>().await?.message)
    }

    async fn fetch_profile(&self, token: &str) -> Result<SessionUser, SessionError> {
        let response = self
            .client
            .get(self.endpoint("/me"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json::<SessionUser>().await?)
    }
}
