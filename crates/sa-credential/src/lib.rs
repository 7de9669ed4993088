//! Service account credentials for the rotation pool
//!
//! Reads Google service account key files and turns them into ready-to-use
//! Drive clients. `KeyFileMaterializer` plugs into `sa_pool::Pool` as the
//! materializer used for preloading.

pub mod client;
pub mod constants;
pub mod error;
pub mod key;

pub use client::{DriveHandle, KeyFileMaterializer};
pub use constants::*;
pub use error::{Error, Result};
pub use key::{ServiceAccountKey, expand_home, expand_path, read_key};
