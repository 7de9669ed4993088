//! Random-pick candidate set guarded by the shared blacklist
//!
//! Reactive mode draws a replacement account at random from the available set
//! when the active one is rate-limited. The failing account is blacklisted and
//! dropped from the set before the draw.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::blacklist::BlacklistRegistry;
use crate::error::{Error, Result};

/// Identifiers eligible for random selection.
#[derive(Debug, Default, Clone)]
pub struct AvailableSet {
    files: HashSet<String>,
}

impl AvailableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        self.files.insert(identifier.into())
    }

    pub fn remove(&mut self, identifier: &str) -> bool {
        self.files.remove(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.files.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.files.iter()
    }

    /// Owned copy of the identifiers, in no particular order.
    pub fn snapshot(&self) -> HashSet<String> {
        self.files.clone()
    }

    /// Draw a random identifier that the blacklist admits.
    ///
    /// A non-empty `exclude` is recorded in `blacklist` and removed from the set
    /// before drawing. Expired blacklist entries are cleared as they are met.
    pub fn select_excluding(
        &mut self,
        exclude: Option<&str>,
        blacklist: &BlacklistRegistry,
    ) -> Result<String> {
        if let Some(exclude) = exclude.filter(|e| !e.is_empty()) {
            blacklist.record(exclude);
            self.files.remove(exclude);
            metrics::counter!("sa_pool_blacklisted_total").increment(1);
        }

        if self.files.is_empty() {
            warn!("no service account files left to select from");
            return Err(Error::NoCandidates);
        }

        let mut keys: Vec<&String> = self.files.iter().collect();
        keys.shuffle(&mut rand::rng());

        match keys.into_iter().find(|file| blacklist.admit(file)) {
            Some(file) => {
                debug!(identifier = file.as_str(), "selected service account");
                Ok(file.clone())
            }
            None => {
                warn!(
                    candidates = self.files.len(),
                    "every remaining service account is blacklisted"
                );
                Err(Error::AllBlacklisted)
            }
        }
    }
}

impl FromIterator<String> for AvailableSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
