// Access gate
// Pure per-request decision: allow, send to sign-in, or send home

use crate::credentials::{CredentialName, CredentialStore};

/// Sign-in page
pub const LOGIN_PATH: &str = "/login";

/// Home page
pub const HOME_PATH: &str = "/";

/// The page gated by the add-book credential instead of the primary one
pub const ADD_BOOK_PATH: &str = "/add-book";

/// Authorization-code exchange endpoint
pub const TOKEN_EXCHANGE_PATH: &str = "/api/auth/token";

/// Prefix of the sign-in callback subtree
const AUTH_PREFIX: &str = "/auth/";

/// Prefix of the static asset namespace
const ASSET_PREFIX: &str = "/static/";

/// Paths reachable with no credential at all, besides the prefixes above
const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, TOKEN_EXCHANGE_PATH, "/favicon.ico", "/health"];

/// Static classification of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    /// Granted by the add-book credential, independently of the primary one
    SeparatelyGated,
    Protected,
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectHome,
}

/// Which credentials a request carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub primary: bool,
    pub add_book: bool,
}

impl CredentialSnapshot {
    pub fn from_store(store: &impl CredentialStore) -> Self {
        Self {
            primary: store.contains(CredentialName::Primary),
            add_book: store.contains(CredentialName::AddBook),
        }
    }
}

/// Classify a path. Depends only on the path text.
pub fn classify(path: &str) -> PathClass {
    if path == ADD_BOOK_PATH {
        return PathClass::SeparatelyGated;
    }

    if PUBLIC_PATHS.contains(&path)
        || path.starts_with(AUTH_PREFIX)
        || path.starts_with(ASSET_PREFIX)
    {
        return PathClass::Public;
    }

    PathClass::Protected
}

/// Decide access for `path` given the credentials present. First match wins:
///
/// 1. add-book page with the add-book credential: allow
/// 2. no primary credential and the path is not public: sign in
/// 3. primary credential on the sign-in page: go home
/// 4. anything else: allow
///
/// The add-book page without its own credential is handled like any other
/// non-public page by rule 2.
pub fn decide(path: &str, credentials: &CredentialSnapshot) -> AccessDecision {
    let class = classify(path);

    if class == PathClass::SeparatelyGated && credentials.add_book {
        return AccessDecision::Allow;
    }

    if !credentials.primary && class != PathClass::Public {
        return AccessDecision::RedirectToLogin;
    }

    if credentials.primary && path == LOGIN_PATH {
        return AccessDecision::RedirectHome;
    }

    AccessDecision::Allow
}
