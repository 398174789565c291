//! Route protection decisions
//!
//! Every page navigation is classified after stripping an optional locale
//! prefix (`/en/...`, `/ru/...`):
//!
//! | Route class     | Paths                   | No token         | Token            |
//! |-----------------|-------------------------|------------------|------------------|
//! | `AuthOnly`      | `/auth/...`             | allow            | → landing page   |
//! | `ProtectedOnly` | `/profile...`, `/chat...` | → login page   | allow            |
//! | `Public`        | everything else         | allow            | allow            |
//!
//! The guard only checks that a non-empty token is carried. It does not verify
//! the signature or expiry: it is the cheap, synchronous first tier. The
//! protected resource (`GET /api/me`) is the authoritative verifier, and the
//! session layer logs out when that fetch is rejected.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Cookie carrying the session token between the browser and the guard
pub const AUTH_COOKIE: &str = "auth-token";

/// Supported UI locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    En,
    #[default]
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ru];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code() == s)
            .ok_or_else(|| format!("unsupported locale: {s}"))
    }
}

/// Abstract route classes the guard distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    /// Only useful while signed out (login, register)
    AuthOnly,
    /// Only reachable while signed in (profile, chat)
    ProtectedOnly,
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

impl GuardDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Redirect(target) => Some(target),
        }
    }
}

const AUTH_PREFIX: &str = "auth";
const PROTECTED_PREFIXES: [&str; 2] = ["profile", "chat"];

/// Split a leading locale segment off `path`
///
/// Returns the locale, if the first segment named one, and the remaining
/// path, which always starts with `/`.
pub fn split_locale(path: &str) -> (Option<Locale>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest_start) = match trimmed.find('/') {
        Some(index) => (&trimmed[..index], index),
        None => (trimmed, trimmed.len()),
    };

    match first.parse::<Locale>() {
        Ok(locale) => {
            let rest = &trimmed[rest_start..];
            (Some(locale), if rest.is_empty() { "/" } else { rest })
        }
        Err(_) if path.starts_with('/') => (None, path),
        Err(_) => (None, "/"),
    }
}

/// Classify a locale-stripped path by its first segment
pub fn classify(path: &str) -> RouteClass {
    let first = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    if first == AUTH_PREFIX {
        RouteClass::AuthOnly
    } else if PROTECTED_PREFIXES.contains(&first) {
        RouteClass::ProtectedOnly
    } else {
        RouteClass::Public
    }
}

/// Login page for `locale`
pub fn login_path(locale: Locale) -> String {
    format!("/{}/auth/login", locale)
}

/// Page signed-in users land on
pub fn landing_path(locale: Locale) -> String {
    format!("/{}/profile", locale)
}

/// Whether a token counts as present; structural check only
pub fn token_present(token: Option<&str>) -> bool {
    token.is_some_and(|t| !t.trim().is_empty())
}

/// Decision table over route class and token presence
pub fn decide_for_class(class: RouteClass, token_present: bool, locale: Locale) -> GuardDecision {
    match (class, token_present) {
        (RouteClass::ProtectedOnly, false) => GuardDecision::Redirect(login_path(locale)),
        (RouteClass::AuthOnly, true) => GuardDecision::Redirect(landing_path(locale)),
        _ => GuardDecision::Allow,
    }
}

/// Decide a navigation to `path` given the carried token, if any
///
/// `path` is percent-decoded first, so `/en/%70rofile` is classed like
/// `/en/profile`, which is what the static file service will serve.
pub fn decide(path: &str, token: Option<&str>) -> GuardDecision {
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let (locale, rest) = split_locale(&decoded);
    decide_for_class(
        classify(rest),
        token_present(token),
        locale.unwrap_or_default(),
    )
}

/// Whether the guard applies to `path` at all
///
/// API routes, bundled assets and anything that looks like a file are
/// passed through untouched.
pub fn is_guarded_path(path: &str) -> bool {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    if first == "api" || first == "pkg" {
        return false;
    }
    !path.split('/').any(|segment| segment.contains('.'))
}
