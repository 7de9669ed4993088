//! Common types for the service account rotation workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
