//! Boundary for turning a service account file into a usable client
//!
//! The pool never performs the OAuth handshake itself. It calls a
//! `Materializer` to build a (client, service) pair for an identifier and
//! treats failures as skip-and-log.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Future returned by [`Materializer::materialize`].
pub type MaterializeFuture<'a, C, S> = Pin<Box<dyn Future<Output = Result<(C, S)>> + Send + 'a>>;

/// Builds a network client and typed service handle from a credential identifier.
///
/// Uses `Pin<Box<dyn Future>>` so implementations can be stored behind `Arc`
/// and shared with background tasks.
pub trait Materializer: Send + Sync {
    /// Network client type (e.g. an HTTP client with auth applied).
    type Client: Clone + Send + Sync + 'static;
    /// Typed API handle built on top of the client.
    type Service: Clone + Send + Sync + 'static;

    /// Build the pair for `identifier`. Called outside the pool lock.
    fn materialize<'a>(
        &'a self,
        identifier: &'a str,
    ) -> MaterializeFuture<'a, Self::Client, Self::Service>;
}
