//! Pool facade: one lock over the rotation index, candidate set and client cache
//!
//! Every mutation of pool state goes through a single `tokio::sync::Mutex`. The
//! critical sections only touch in-memory maps; the directory scan in `load` and
//! client construction in `preload` run before the lock is taken or after it is
//! released. The blacklist registry sits outside this lock and is shared with
//! every other pool in the process.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::blacklist::BlacklistRegistry;
use crate::cache::{Preloaded, PreloadedCache};
use crate::candidates::AvailableSet;
use crate::error::{Error, Result};
use crate::materialize::Materializer;
use crate::rotation::RotationIndex;
use crate::scan::scan_credentials;

struct PoolState<C, S> {
    index: RotationIndex,
    available: AvailableSet,
    cache: PreloadedCache<C, S>,
}

/// Service account pool combining sequential rollover, blacklist-guarded random
/// selection and a preloaded client cache.
pub struct Pool<M: Materializer> {
    state: Mutex<PoolState<M::Client, M::Service>>,
    blacklist: Arc<BlacklistRegistry>,
    materializer: M,
}

impl<M: Materializer> Pool<M> {
    /// Create an empty pool backed by the process-wide blacklist.
    ///
    /// `max_preloaded` caps how many preloaded pairs are kept in memory.
    pub fn new(materializer: M, max_preloaded: usize) -> Self {
        Self::with_blacklist(materializer, max_preloaded, BlacklistRegistry::global())
    }

    /// Create an empty pool sharing the given blacklist.
    pub fn with_blacklist(
        materializer: M,
        max_preloaded: usize,
        blacklist: Arc<BlacklistRegistry>,
    ) -> Self {
        Self {
            state: Mutex::new(PoolState {
                index: RotationIndex::new(),
                available: AvailableSet::new(),
                cache: PreloadedCache::new(max_preloaded),
            }),
            blacklist,
            materializer,
        }
    }

    /// Load credential files from `dir`.
    ///
    /// Every file feeds the rotation index; all but `active` feed the available
    /// set, which is returned. An empty `dir` leaves the pool untouched.
    pub async fn load(&self, dir: &Path, active: &str) -> Result<HashSet<String>> {
        if dir.as_os_str().is_empty() {
            return Ok(self.state.lock().await.available.snapshot());
        }

        debug!(dir = %dir.display(), "loading service account files");
        let files = scan_credentials(dir).await?;
        let available: AvailableSet = files
            .iter()
            .filter(|file| file.as_str() != active)
            .cloned()
            .collect();

        let mut state = self.state.lock().await;
        state.available = available;
        state.index.rebuild(&files, active);
        info!(
            available = state.available.len(),
            indexed = state.index.len(),
            "loaded service account files"
        );
        Ok(state.available.snapshot())
    }

    /// Next non-stale account in sequence, without switching to it.
    pub async fn rollover(&self) -> Option<String> {
        self.state.lock().await.index.rollover()
    }

    /// Switch the rotation index to `identifier`; unknown identifiers are ignored.
    pub async fn set_active(&self, identifier: &str) {
        self.state.lock().await.index.set_active(identifier);
    }

    /// Rolling mode: advance to the next non-stale account and activate it.
    pub async fn roll(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let next = state.index.rollover().ok_or(Error::Exhausted)?;
        state.index.set_active(&next);
        metrics::counter!("sa_pool_rotations_total", "kind" => "roll").increment(1);
        debug!(identifier = next, "rolled to next service account");
        Ok(next)
    }

    /// Mark `target` (or the active account) stale and activate a random live one.
    pub async fn mark_stale(&self, target: Option<&str>) -> Result<String> {
        let result = self.state.lock().await.index.mark_stale(target);
        metrics::counter!("sa_pool_rotations_total", "kind" => "stale").increment(1);
        if let Err(Error::Exhausted) = &result {
            warn!("every service account is stale");
        }
        result
    }

    /// Return a stale account to sequential rotation.
    pub async fn revert_stale(&self, target: &str) {
        self.state.lock().await.index.revert_stale(target);
    }

    /// Draw a random admitted account, blacklisting `exclude` first.
    pub async fn select_excluding(&self, exclude: Option<&str>) -> Result<String> {
        let mut state = self.state.lock().await;
        state.available.select_excluding(exclude, &self.blacklist)
    }

    /// Reactive mode: blacklist `failing`, draw a replacement and activate it
    /// in the rotation index as well. A replacement that was stale in the
    /// index is returned to rotation so it can become active.
    pub async fn replace(&self, failing: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        let next = state
            .available
            .select_excluding(Some(failing), &self.blacklist)?;
        state.index.revert_stale(&next);
        state.index.set_active(&next);
        metrics::counter!("sa_pool_rotations_total", "kind" => "replace").increment(1);
        info!(failing, replacement = next, "replaced rate-limited service account");
        Ok(next)
    }

    /// Identifier the rotation index currently considers active.
    pub async fn active(&self) -> Option<String> {
        self.state.lock().await.index.active().map(str::to_string)
    }

    /// Snapshot of the identifiers eligible for random selection.
    pub async fn available(&self) -> HashSet<String> {
        self.state.lock().await.available.snapshot()
    }

    /// Push a preloaded pair to the front of the cache.
    pub async fn offer(&self, client: M::Client, service: M::Service) {
        let mut state = self.state.lock().await;
        state.cache.offer(Preloaded::new(client, service));
        metrics::gauge!("sa_pool_preloaded").set(state.cache.len() as f64);
    }

    /// Take the front preloaded pair, rotating it to the back.
    pub async fn take(&self) -> Result<Preloaded<M::Client, M::Service>> {
        self.state.lock().await.cache.take()
    }

    /// Number of preloaded pairs currently cached.
    pub async fn preloaded_len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    /// Build up to `count` pairs from the available set and prepend them.
    ///
    /// Materialization happens outside the lock. An account that fails to
    /// materialize is logged and skipped. Returns how many pairs were built.
    pub async fn preload(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let candidates: Vec<String> = {
            let state = self.state.lock().await;
            state.available.iter().cloned().collect()
        };

        let mut built = Vec::with_capacity(count.min(candidates.len()));
        for identifier in &candidates {
            if built.len() >= count {
                break;
            }
            match self.materializer.materialize(identifier).await {
                Ok((client, service)) => built.push(Preloaded::new(client, service)),
                Err(e) => {
                    warn!(identifier, error = %e, "preloading service account failed, skipping");
                    metrics::counter!("sa_pool_preload_failures_total").increment(1);
                }
            }
        }

        let count_built = built.len();
        let mut state = self.state.lock().await;
        state.cache.prepend(built);
        metrics::gauge!("sa_pool_preloaded").set(state.cache.len() as f64);
        debug!(
            preloaded = count_built,
            cached = state.cache.len(),
            "preloaded services from service accounts"
        );
        count_built
    }

    /// The blacklist this pool consults.
    pub fn blacklist(&self) -> &Arc<BlacklistRegistry> {
        &self.blacklist
    }

    /// Pool summary for the health endpoint.
    ///
    /// `unhealthy` when neither strategy has anything left to hand out,
    /// `degraded` when some accounts are stale or blacklisted, `healthy` otherwise.
    pub async fn status(&self) -> serde_json::Value {
        let state = self.state.lock().await;
        let total = state.index.len();
        let live = state.index.live_len();
        let stale: Vec<&str> = state
            .index
            .entries()
            .iter()
            .filter(|entry| entry.stale)
            .map(|entry| entry.identifier.as_str())
            .collect();
        let available = state.available.len();
        let blacklisted = state
            .available
            .iter()
            .filter(|file| self.blacklist.is_blacklisted(file))
            .count();
        let selectable = available - blacklisted;

        let status = if total == 0 || (live == 0 && selectable == 0) {
            "unhealthy"
        } else if live < total || selectable < available {
            "degraded"
        } else {
            "healthy"
        };

        serde_json::json!({
            "status": status,
            "active": state.index.active(),
            "accounts_total": total,
            "accounts_stale": stale.len(),
            "accounts_available": available,
            "accounts_blacklisted": blacklisted,
            "stale": stale,
            "preloaded": state.cache.len(),
            "preload_capacity": state.cache.capacity(),
        })
    }
}
