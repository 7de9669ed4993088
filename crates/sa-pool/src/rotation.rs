//! Sequential rotation index with stale tracking
//!
//! An ordered view over every known service account. Rolling mode walks it
//! forward one entry at a time, wrapping at the end and skipping entries that
//! have been marked stale. Stale entries leave the live lookup map but keep
//! their position so they can be reverted later.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One service account in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub identifier: String,
    pub stale: bool,
}

/// Dense, position-addressed list of accounts plus the active pointer.
///
/// `live` maps identifier → position for exactly the non-stale entries.
/// `active` is either a valid position or `None`.
#[derive(Debug, Default)]
pub struct RotationIndex {
    entries: Vec<CredentialEntry>,
    live: HashMap<String, usize>,
    active: Option<usize>,
}

impl RotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index with `identifiers`, activating `active`.
    ///
    /// Does nothing when either input is empty. When `active` is missing from
    /// `identifiers` it is appended so the account in use is always tracked.
    pub fn rebuild(&mut self, identifiers: &[String], active: &str) {
        if identifiers.is_empty() || active.is_empty() {
            return;
        }

        let mut entries = Vec::with_capacity(identifiers.len() + 1);
        let mut live = HashMap::with_capacity(identifiers.len() + 1);
        for (idx, identifier) in identifiers.iter().enumerate() {
            entries.push(CredentialEntry {
                identifier: identifier.clone(),
                stale: false,
            });
            live.insert(identifier.clone(), idx);
        }
        self.entries = entries;
        self.live = live;

        let active_idx = match self.live.get(active) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(CredentialEntry {
                    identifier: active.to_string(),
                    stale: false,
                });
                self.live.insert(active.to_string(), idx);
                idx
            }
        };
        self.active = Some(active_idx);
        debug!(
            entries = self.entries.len(),
            active, "rotation index rebuilt"
        );
    }

    /// Next non-stale identifier after the active one, wrapping around.
    ///
    /// Leaves the active pointer alone; commit with `set_active`.
    pub fn rollover(&self) -> Option<String> {
        let n = self.entries.len();
        // An exhausted index scans everything from position 0.
        let start = self.active.map_or(0, |idx| idx + 1);
        let wrap_end = self.active.unwrap_or(0);

        (start..n)
            .chain(0..wrap_end)
            .map(|idx| &self.entries[idx])
            .find(|entry| !entry.stale)
            .map(|entry| entry.identifier.clone())
    }

    /// Make `identifier` active. Unknown or stale identifiers are ignored.
    pub fn set_active(&mut self, identifier: &str) {
        if let Some(&idx) = self.live.get(identifier) {
            self.active = Some(idx);
        }
    }

    /// Mark `target` (or the active entry when `None`/empty) stale and activate
    /// a random live entry in its place.
    ///
    /// Returns the newly active identifier, or `Exhausted` once no live entries
    /// remain.
    pub fn mark_stale(&mut self, target: Option<&str>) -> Result<String> {
        let target = match target.filter(|t| !t.is_empty()) {
            Some(t) => Some(t.to_string()),
            None => self.active.map(|idx| self.entries[idx].identifier.clone()),
        };

        if let Some(idx) = target.as_deref().and_then(|t| self.live.remove(t)) {
            self.entries[idx].stale = true;
            info!(identifier = self.entries[idx].identifier, "service account marked stale");
        }

        match self.random_pick() {
            Some(idx) => {
                self.active = Some(idx);
                Ok(self.entries[idx].identifier.clone())
            }
            None => {
                self.active = None;
                Err(Error::Exhausted)
            }
        }
    }

    /// Return a stale entry to rotation without changing the active pointer.
    /// Empty or unknown targets are ignored.
    pub fn revert_stale(&mut self, target: &str) {
        if target.is_empty() {
            return;
        }
        if let Some(idx) = self.position(target) {
            self.entries[idx].stale = false;
            self.live.insert(target.to_string(), idx);
            debug!(identifier = target, "stale service account reverted");
        }
    }

    /// Uniformly random position among the live entries.
    pub fn random_pick(&self) -> Option<usize> {
        let positions: Vec<usize> = self.live.values().copied().collect();
        positions.choose(&mut rand::rng()).copied()
    }

    /// Identifier of the active entry.
    pub fn active(&self) -> Option<&str> {
        self.active.map(|idx| self.entries[idx].identifier.as_str())
    }

    pub fn active_position(&self) -> Option<usize> {
        self.active
    }

    /// Total entries, stale included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries not marked stale.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.live.is_empty()
    }

    pub fn is_stale(&self, identifier: &str) -> bool {
        self.position(identifier)
            .is_some_and(|idx| self.entries[idx].stale)
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.identifier == identifier)
    }
}
