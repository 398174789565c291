//! User store
//!
//! A flat list of user records shared by the auth endpoints. The list held in
//! memory is authoritative for the process; when a users file is configured
//! every successful insert is written through to it as pretty-printed JSON,
//! and the file is read once when the repository is opened.
//!
//! Inserts hold the write lock across the duplicate check, id assignment and
//! append, so concurrent registrations cannot observe the same next id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::credentials::{CredentialError, CredentialVerifier};

/// User store error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("No user ids left to assign")]
    IdsExhausted,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Users file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Users file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// A stored user, including the protected secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password: String,
    pub registration_date: DateTime<Utc>,
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

/// User data safe to hand to clients (no secret)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub registration_date: DateTime<Utc>,
    pub subscriptions: Vec<String>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            registration_date: user.registration_date,
            subscriptions: user.subscriptions,
        }
    }
}

/// Registration date shared by the demo accounts
fn demo_registration_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

fn demo_subscriptions() -> Vec<String> {
    vec!["Basic Plan".to_string(), "Premium Content".to_string()]
}

/// Demo accounts present in a fresh store, secrets protected by `verifier`
pub fn seed_users(verifier: &dyn CredentialVerifier) -> Result<Vec<UserRecord>, CredentialError> {
    let accounts = [("test@example.com", "password123"), ("demo@example.com", "123123")];

    accounts
        .iter()
        .enumerate()
        .map(|(index, (email, password))| {
            Ok(UserRecord {
                id: (index + 1).to_string(),
                email: email.to_string(),
                password: verifier.protect(password)?,
                registration_date: demo_registration_date(),
                subscriptions: demo_subscriptions(),
            })
        })
        .collect()
}

/// Next sequential id: one past the largest numeric id in `users`
fn next_id(users: &[UserRecord]) -> Result<String, UserRepositoryError> {
    let max = users
        .iter()
        .filter_map(|u| u.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    max.checked_add(1)
        .map(|id| id.to_string())
        .ok_or(UserRepositoryError::IdsExhausted)
}

/// User repository over the shared list
#[derive(Clone)]
pub struct UserRepository {
    users: Arc<RwLock<Vec<UserRecord>>>,
    file: Option<PathBuf>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl UserRepository {
    /// In-memory store holding `users` (secrets must already be protected)
    pub fn with_users(users: Vec<UserRecord>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
            file: None,
            verifier,
        }
    }

    /// In-memory store pre-populated with the demo accounts
    pub fn in_memory(verifier: Arc<dyn CredentialVerifier>) -> Result<Self, UserRepositoryError> {
        let users = seed_users(verifier.as_ref())?;
        Ok(Self::with_users(users, verifier))
    }

    /// File-backed store
    ///
    /// Reads `path` if it exists, otherwise creates it with the demo accounts.
    pub async fn open(
        path: impl Into<PathBuf>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, UserRepositoryError> {
        let path = path.into();

        let users = if tokio::fs::try_exists(&path).await? {
            let data = tokio::fs::read(&path).await?;
            serde_json::from_slice::<Vec<UserRecord>>(&data)?
        } else {
            let users = seed_users(verifier.as_ref())?;
            write_users(&path, &users).await?;
            tracing::info!("Created users file {} with demo accounts", path.display());
            users
        };

        tracing::debug!("Loaded {} users from {}", users.len(), path.display());

        Ok(Self {
            users: Arc::new(RwLock::new(users)),
            file: Some(path),
            verifier,
        })
    }

    /// Find a user whose email and secret both match
    pub async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, UserRepositoryError> {
        let users = self.users.read().await;

        for user in users.iter().filter(|u| u.email == email) {
            if self.verifier.verify(password, &user.password)? {
                return Ok(Some(user.clone()));
            }
        }

        Ok(None)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    /// Register a new user with a fresh secret
    pub async fn insert(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, UserRepositoryError> {
        let password = self.verifier.protect(password)?;

        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == email) {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        let user = UserRecord {
            id: next_id(&users)?,
            email: email.to_string(),
            password,
            registration_date: Utc::now(),
            subscriptions: Vec::new(),
        };

        users.push(user.clone());

        if let Some(path) = &self.file
            && let Err(e) = write_users(path, &users).await
        {
            users.pop();
            return Err(e);
        }

        Ok(user)
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

async fn write_users(path: &Path, users: &[UserRecord]) -> Result<(), UserRepositoryError> {
    let data = serde_json::to_vec_pretty(users)?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::credentials::{BcryptVerifier, PlaintextVerifier};

    fn plaintext() -> Arc<dyn CredentialVerifier> {
        Arc::new(PlaintextVerifier)
    }

    fn empty_repo() -> UserRepository {
        UserRepository::with_users(Vec::new(), plaintext())
    }

    // ========================================================================
    // Lookup Tests
    // ========================================================================

    #[tokio::test]
    async fn test_seeded_store_finds_demo_user() {
        let repo = UserRepository::in_memory(plaintext()).unwrap();

        let user = repo
            .find_by_credentials("test@example.com", "password123")
            .await
            .unwrap()
            .expect("demo user");

        assert_eq!(user.id, "1");
        assert_eq!(user.subscriptions, demo_subscriptions());
        assert_eq!(user.registration_date.to_rfc3339(), "2024-01-15T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_find_by_credentials_wrong_secret() {
        let repo = UserRepository::in_memory(plaintext()).unwrap();

        let result = repo
            .find_by_credentials("test@example.com", "wrong")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_credentials_unknown_email() {
        let repo = UserRepository::in_memory(plaintext()).unwrap();

        let result = repo
            .find_by_credentials("nobody@example.com", "password123")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let repo = UserRepository::in_memory(plaintext()).unwrap();

        assert_eq!(repo.find_by_id("2").await.unwrap().email, "demo@example.com");
        assert!(repo.find_by_id("999").await.is_none());
    }

    // ========================================================================
    // Insert Tests
    // ========================================================================

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = empty_repo();

        let first = repo.insert("a@b.com", "secret1").await.unwrap();
        let second = repo.insert("c@d.com", "secret2").await.unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert!(first.subscriptions.is_empty());
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_insert_after_seeds_continues_numbering() {
        let repo = UserRepository::in_memory(plaintext()).unwrap();

        let user = repo.insert("a@b.com", "secret1").await.unwrap();
        assert_eq!(user.id, "3");
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_fails() {
        let repo = empty_repo();

        repo.insert("a@b.com", "secret1").await.unwrap();
        let result = repo.insert("a@b.com", "other").await;

        assert!(matches!(result, Err(UserRepositoryError::EmailAlreadyExists)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let repo = empty_repo();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.insert(&format!("user{i}@example.com"), "pw")
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 16);
    }

    #[tokio::test]
    async fn test_insert_with_bcrypt_stores_hash() {
        let repo = UserRepository::with_users(Vec::new(), Arc::new(BcryptVerifier::new(4)));

        let user = repo.insert("a@b.com", "secret1").await.unwrap();

        assert_ne!(user.password, "secret1");
        let found = repo.find_by_credentials("a@b.com", "secret1").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    // ========================================================================
    // File Persistence Tests
    // ========================================================================

    #[tokio::test]
    async fn test_bcrypt_over_plaintext_file_is_a_non_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        UserRepository::open(&path, plaintext()).await.unwrap();

        let repo = UserRepository::open(&path, Arc::new(BcryptVerifier::new(4)))
            .await
            .unwrap();

        for password in ["password123", "wrong"] {
            let found = repo
                .find_by_credentials("test@example.com", password)
                .await
                .unwrap();
            assert!(found.is_none(), "{password}");
        }
    }

    #[tokio::test]
    async fn test_open_creates_file_with_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let repo = UserRepository::open(&path, plaintext()).await.unwrap();

        assert_eq!(repo.len().await, 2);
        assert!(path.exists());
        let on_disk: Vec<UserRecord> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[tokio::test]
    async fn test_inserted_user_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let repo = UserRepository::open(&path, plaintext()).await.unwrap();
        let user = repo.insert("a@b.com", "secret1").await.unwrap();

        let reopened = UserRepository::open(&path, plaintext()).await.unwrap();
        let found = reopened
            .find_by_credentials("a@b.com", "secret1")
            .await
            .unwrap();

        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_open_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "not json").unwrap();

        let result = UserRepository::open(&path, plaintext()).await;
        assert!(matches!(result, Err(UserRepositoryError::Format(_))));
    }

    #[tokio::test]
    async fn test_users_file_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        UserRepository::open(&path, plaintext()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("registrationDate"));
        assert!(raw.contains("subscriptions"));
    }

    // ========================================================================
    // Model Tests
    // ========================================================================

    #[test]
    fn test_profile_drops_password() {
        let record = UserRecord {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            registration_date: demo_registration_date(),
            subscriptions: vec![],
        };

        let profile: UserProfile = record.into();
        let json = serde_json::to_value(&profile).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["registrationDate"], "2024-01-15T12:00:00Z");
    }

    #[test]
    fn test_next_id_skips_non_numeric() {
        let mut record = UserRecord {
            id: "abc".to_string(),
            email: "x@y.z".to_string(),
            password: String::new(),
            registration_date: Utc::now(),
            subscriptions: vec![],
        };
        assert_eq!(next_id(std::slice::from_ref(&record)).unwrap(), "1");

        record.id = "7".to_string();
        assert_eq!(next_id(&[record]).unwrap(), "8");
    }

    #[tokio::test]
    async fn test_insert_fails_when_ids_exhausted() {
        let record = UserRecord {
            id: u64::MAX.to_string(),
            email: "last@example.com".to_string(),
            password: "pw".to_string(),
            registration_date: Utc::now(),
            subscriptions: vec![],
        };
        let repo = UserRepository::with_users(vec![record], plaintext());

        let result = repo.insert("a@b.com", "secret1").await;

        assert!(matches!(result, Err(UserRepositoryError::IdsExhausted)));
        assert_eq!(repo.len().await, 1);
    }
}
