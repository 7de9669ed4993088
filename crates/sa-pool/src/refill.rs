//! Background refill of the preloaded client cache
//!
//! Keeps the cache topped up so account switches rarely hit an empty cache.
//! The refill runs independently of callers; building clients happens outside
//! the pool lock, so callers are never blocked on it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::materialize::Materializer;
use crate::pool::Pool;

/// Spawn a task that tops the cache up to `target` pairs every `interval`.
///
/// The first tick is skipped since the cache is usually preloaded at startup.
/// Returns the `JoinHandle` for the spawned task.
pub fn spawn_refill_task<M>(
    pool: Arc<Pool<M>>,
    interval: Duration,
    target: usize,
) -> tokio::task::JoinHandle<()>
where
    M: Materializer + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            refill_cycle(&pool, target).await;
        }
    })
}

/// Run one refill cycle. Returns how many pairs were built.
pub async fn refill_cycle<M: Materializer>(pool: &Pool<M>, target: usize) -> usize {
    let cached = pool.preloaded_len().await;
    if cached >= target {
        debug!(cached, target, "preloaded cache full, skipping refill");
        return 0;
    }

    let built = pool.preload(target - cached).await;
    if built > 0 {
        info!(built, cached = cached + built, target, "refilled preloaded cache");
    }
    built
}
