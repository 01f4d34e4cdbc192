// In-process credential store with an injectable clock

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{CredentialName, CredentialStore};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Credential store kept in memory; entries expire against the clock
pub struct MemoryStore<C: Clock = SystemClock> {
    clock: C,
    entries: HashMap<CredentialName, Entry>,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: HashMap::new(),
        }
    }

    /// Absolute expiry of the entry under `name`, if one is live
    pub fn expires_at(&self, name: CredentialName) -> Option<DateTime<Utc>> {
        self.entries
            .get(&name)
            .filter(|entry| entry.expires_at > self.clock.now())
            .map(|entry| entry.expires_at)
    }
}

impl<C: Clock> CredentialStore for MemoryStore<C> {
    fn get(&self, name: CredentialName) -> Option<String> {
        let now = self.clock.now();
        self.entries
            .get(&name)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    fn set(&mut self, name: CredentialName, value: &str, ttl: Duration) {
        let ttl =
            chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            name,
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    fn delete(&mut self, name: CredentialName) {
        self.entries.remove(&name);
    }
}
