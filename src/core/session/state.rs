//! Client session state

use serde::{Deserialize, Serialize};

/// Cached profile of the signed-in user
///
/// Every field is optional: the cache may hold only what the login form
/// knew, and is filled in once the profile has been fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<String>>,
}

/// Token and cached profile, as persisted between page loads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl SessionState {
    /// Authenticated means a non-empty token is held
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_is_derived_from_token() {
        let mut state = SessionState::default();
        assert!(!state.is_authenticated());

        state.token = Some(String::new());
        assert!(!state.is_authenticated());

        state.token = Some("abc".to_string());
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_user_does_not_imply_authenticated() {
        let state = SessionState {
            token: None,
            user: Some(SessionUser::default()),
        };
        assert!(!state.is_authenticated());
        assert!(!state.is_empty());
    }

    #[test]
    fn test_session_user_from_profile_json() {
        let json = r#"{
            "id": "1",
            "email": "test@example.com",
            "registrationDate": "2024-01-15T12:00:00Z",
            "subscriptions": ["Basic Plan"]
        }"#;

        let user: SessionUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id.as_deref(), Some("1"));
        assert_eq!(user.registration_date.as_deref(), Some("2024-01-15T12:00:00Z"));
        assert_eq!(user.subscriptions, Some(vec!["Basic Plan".to_string()]));
    }
}
