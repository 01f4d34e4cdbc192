// Credential storage
// Named, expiring credential slots backed by browser cookies or process memory

mod cookie;
mod memory;

use std::time::Duration;

pub use cookie::{CookieJar, CookiePolicy, SameSite};
pub use memory::{Clock, ManualClock, MemoryStore, SystemClock};

/// The two fixed credential identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialName {
    /// Grants access to every protected page
    Primary,
    /// Grants access to the add-book page only
    AddBook,
}

impl CredentialName {
    /// Cookie name the credential is stored under
    pub const fn cookie_name(self) -> &'static str {
        match self {
            CredentialName::Primary => "auth_token",
            CredentialName::AddBook => "add_book_token",
        }
    }
}

impl std::fmt::Display for CredentialName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cookie_name())
    }
}

/// Key/value store for credentials with per-entry lifetime.
///
/// Expired and deleted entries are indistinguishable: both read as `None`.
/// Writes never fail; a store that cannot persist a value drops it.
pub trait CredentialStore {
    /// Current unexpired value stored under `name`
    fn get(&self, name: CredentialName) -> Option<String>;

    /// Store `value` under `name`, readable for `ttl`. Overwrites any prior value.
    fn set(&mut self, name: CredentialName, value: &str, ttl: Duration);

    /// Remove any value under `name`. Idempotent.
    fn delete(&mut self, name: CredentialName);

    fn contains(&self, name: CredentialName) -> bool {
        self.get(name).is_some()
    }
}
