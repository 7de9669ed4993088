//! Process-wide blacklist of rate-limited service accounts
//!
//! Quota exhaustion belongs to the credential, not to a pool, so every pool in
//! the process shares one registry. Entries expire after `BLACKLIST_TTL`; expiry
//! is checked lazily when an entry is read, there is no background sweep.
//!
//! The registry has its own lock, independent of any pool's lock. Races between
//! pools are tolerated: recording the same identifier twice is idempotent, and a
//! missed record only costs one extra failed call.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// How long a blacklisted account stays ineligible. Aligned with the daily
/// quota reset plus an hour of slack.
pub const BLACKLIST_TTL: Duration = Duration::from_secs(25 * 60 * 60);

static GLOBAL: OnceLock<Arc<BlacklistRegistry>> = OnceLock::new();

/// Shared identifier → time-of-blacklisting map.
#[derive(Debug, Default)]
pub struct BlacklistRegistry {
    entries: RwLock<HashMap<String, Instant>>,
}

impl BlacklistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every pool in this process. Lives until exit.
    pub fn global() -> Arc<BlacklistRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(BlacklistRegistry::new()))
            .clone()
    }

    /// Blacklist `identifier` as of now. Re-recording refreshes the timestamp.
    pub fn record(&self, identifier: &str) {
        self.entries
            .write()
            .insert(identifier.to_string(), Instant::now());
        debug!(identifier, "service account blacklisted");
    }

    /// Whether `identifier` is blacklisted and still within the TTL.
    pub fn is_blacklisted(&self, identifier: &str) -> bool {
        self.entries
            .read()
            .get(identifier)
            .is_some_and(|at| at.elapsed() <= BLACKLIST_TTL)
    }

    /// Check whether `identifier` may be handed out.
    ///
    /// Absent identifiers are admitted. An expired entry is deleted and the
    /// identifier admitted. An unexpired entry is refused.
    pub fn admit(&self, identifier: &str) -> bool {
        let recorded = self.entries.read().get(identifier).copied();
        match recorded {
            None => true,
            Some(at) if at.elapsed() > BLACKLIST_TTL => self.evict_if_expired(identifier),
            Some(_) => false,
        }
    }

    /// Remove `identifier` only if its entry is still expired under the write
    /// lock. A concurrent `record` since the read wins and the identifier is refused.
    fn evict_if_expired(&self, identifier: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get(identifier) {
            None => true,
            Some(at) if at.elapsed() > BLACKLIST_TTL => {
                entries.remove(identifier);
                debug!(identifier, "blacklist entry expired, cleared");
                true
            }
            Some(_) => false,
        }
    }

    /// Drop an entry regardless of age.
    pub fn remove(&self, identifier: &str) -> bool {
        self.entries.write().remove(identifier).is_some()
    }

    /// Whether an entry is physically present, expired or not.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.read().contains_key(identifier)
    }

    /// Number of identifiers currently within the TTL.
    pub fn active_len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|at| at.elapsed() <= BLACKLIST_TTL)
            .count()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
