//! Session context: the single owner of client auth state
//!
//! A [`SessionContext`] is built once per app instance and shared by
//! reference (or `Arc`) with whatever needs to read or change the session.
//! Every mutation is written through to [`SessionStorage`] and the
//! authenticated flag is published on a `watch` channel.
//!
//! Remote calls capture a generation number before they start. Mutations that
//! change the token (login, logout) bump it, and a response that arrives for
//! an older generation is dropped with [`SessionError::Superseded`]. A login
//! that completes after the user already logged out therefore cannot sign
//! them back in.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cookie::Cookie;
use tokio::sync::watch;

use super::backend::AuthBackend;
use super::error::SessionError;
use super::state::{SessionState, SessionUser};
use super::storage::SessionStorage;
use crate::core::guard::{AUTH_COOKIE, Locale, landing_path, login_path};

/// Lifetime of the auth cookie mirrored to the browser
pub const AUTH_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Where the UI should go after a session operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ProceedToLanding,
    ProceedToLogin,
}

impl SessionEvent {
    pub fn target(self, locale: Locale) -> String {
        match self {
            SessionEvent::ProceedToLanding => landing_path(locale),
            SessionEvent::ProceedToLogin => login_path(locale),
        }
    }
}

struct Inner {
    state: SessionState,
    generation: u64,
}

pub struct SessionContext<S, B> {
    inner: Mutex<Inner>,
    authenticated: watch::Sender<bool>,
    storage: S,
    backend: B,
}

impl<S: SessionStorage, B: AuthBackend> SessionContext<S, B> {
    /// Restore the persisted session, if any
    ///
    /// Unreadable storage starts an empty session rather than failing.
    pub fn init(storage: S, backend: B) -> Self {
        let state = match storage.load() {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to restore session, starting signed out: {}", e);
                SessionState::default()
            }
        };
        let (authenticated, _) = watch::channel(state.is_authenticated());

        Self {
            inner: Mutex::new(Inner {
                state,
                generation: 0,
            }),
            authenticated,
            storage,
            backend,
        }
    }

    /// Flush the current state and release the context
    ///
    /// Subscribers see the channel close.
    pub fn teardown(self) {
        let inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        persist(&self.storage, &inner.state);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Apply `mutate` if no token-changing mutation happened since `expected`
    fn commit(
        &self,
        expected: u64,
        bump: bool,
        mutate: impl FnOnce(&mut SessionState),
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.generation != expected {
            tracing::debug!(
                "Dropping stale session response (generation {} != {})",
                expected,
                inner.generation
            );
            return Err(SessionError::Superseded);
        }

        mutate(&mut inner.state);
        if bump {
            inner.generation += 1;
        }
        persist(&self.storage, &inner.state);
        let authenticated = inner.state.is_authenticated();
        self.authenticated
            .send_if_modified(|current| replace_flag(current, authenticated));
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().state.token.clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.lock().state.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().state.is_authenticated()
    }

    /// Observe the authenticated flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Sign in with credentials
    ///
    /// On success the token is stored and any cached profile from a
    /// previous identity is dropped.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionEvent, SessionError> {
        let generation = self.generation();
        let token = self.backend.login(email, password).await?;

        self.commit(generation, true, |state| {
            state.token = Some(token);
            state.user = None;
        })?;
        tracing::info!("Signed in as {}", email);
        Ok(SessionEvent::ProceedToLanding)
    }

    /// Create an account; the session itself is not changed
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionEvent, SessionError> {
        let message = self.backend.register(email, password).await?;
        tracing::info!("Registered {}: {}", email, message);
        Ok(SessionEvent::ProceedToLogin)
    }

    /// Sign out: clears token and profile everywhere
    pub fn logout(&self) -> SessionEvent {
        let mut inner = self.lock();
        inner.state = SessionState::default();
        inner.generation += 1;
        persist(&self.storage, &inner.state);
        self.authenticated.send_replace(false);
        SessionEvent::ProceedToLogin
    }

    /// Replace the cached profile; the token is untouched
    pub fn set_user(&self, user: SessionUser) {
        let mut inner = self.lock();
        inner.state.user = Some(user);
        persist(&self.storage, &inner.state);
    }

    /// Fetch the profile for the held token and cache it
    ///
    /// A 401 means the server no longer accepts the token (expired, forged,
    /// or signed with a rotated secret): the session is logged out and the
    /// rejection is returned so the UI can move to the login page.
    pub async fn fetch_profile(&self) -> Result<SessionUser, SessionError> {
        let (token, generation) = {
            let inner = self.lock();
            (inner.state.token.clone(), inner.generation)
        };
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::NotAuthenticated)?;

        match self.backend.fetch_profile(&token).await {
            Ok(user) => {
                let cached = user.clone();
                self.commit(generation, false, |state| state.user = Some(cached))?;
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => {
                if self.generation() == generation {
                    tracing::info!("Token rejected by server, signing out");
                    self.logout();
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Cookie mirroring the token for the route guard
    ///
    /// When signed out this is a removal cookie for `auth-token`.
    pub fn auth_cookie(&self) -> Cookie<'static> {
        match self.token().filter(|t| !t.is_empty()) {
            Some(token) => Cookie::build((AUTH_COOKIE, token))
                .path("/")
                .max_age(cookie::time::Duration::days(AUTH_COOKIE_MAX_AGE_DAYS))
                .build(),
            None => {
                let mut cookie = Cookie::build((AUTH_COOKIE, "")).path("/").build();
                cookie.make_removal();
                cookie
            }
        }
    }
}

fn replace_flag(current: &mut bool, next: bool) -> bool {
    let changed = *current != next;
    *current = next;
    changed
}

fn persist<S: SessionStorage>(storage: &S, state: &SessionState) {
    let result = if state.is_empty() {
        storage.clear()
    } else {
        storage.save(state)
    };
    if let Err(e) = result {
        tracing::warn!("Failed to persist session: {}", e);
    }
}
