//! Service account pool for high-volume cloud storage clients
//!
//! Rotates interchangeable service account credentials so that per-account daily
//! quotas are spread across many accounts. Two strategies share one pool:
//!
//! 1. Rolling: walk the accounts in directory order before each unit of work,
//!    skipping accounts marked stale (`Pool::roll`, `Pool::mark_stale`).
//! 2. Reactive: when an account is rate-limited, blacklist it for 25 hours and
//!    draw a random replacement (`Pool::replace`, `Pool::select_excluding`).
//!
//! A bounded cache of preloaded clients (`Pool::preload`, `Pool::take`) removes
//! client construction latency from account switches. The blacklist is shared
//! by every pool in the process.

pub mod blacklist;
pub mod cache;
pub mod candidates;
pub mod error;
pub mod materialize;
pub mod pool;
pub mod refill;
pub mod rotation;
pub mod scan;

pub use blacklist::{BLACKLIST_TTL, BlacklistRegistry};
pub use cache::{Preloaded, PreloadedCache};
pub use candidates::AvailableSet;
pub use error::{Error, Result};
pub use materialize::{MaterializeFuture, Materializer};
pub use pool::Pool;
pub use refill::{refill_cycle, spawn_refill_task};
pub use rotation::{CredentialEntry, RotationIndex};
pub use scan::{CREDENTIAL_EXTENSION, scan_credentials};
