//! Error types for pool operations

/// Errors from pool operations.
///
/// `NoCandidates`, `AllBlacklisted`, `Exhausted` and `EmptyCache` are steady-state
/// conditions the caller is expected to handle; `Io` and `Materialize` carry
/// underlying failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no available service account file")]
    NoCandidates,

    #[error("no available service account file (all blacklisted)")]
    AllBlacklisted,

    #[error("all service accounts are stale")]
    Exhausted,

    #[error("no available preloaded services")]
    EmptyCache,

    #[error("error loading service accounts: {0}")]
    Io(String),

    #[error("materializing {identifier}: {reason}")]
    Materialize { identifier: String, reason: String },
}

impl Error {
    /// Stable label for logs, metrics and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoCandidates => "no_candidates",
            Error::AllBlacklisted => "all_blacklisted",
            Error::Exhausted => "exhausted",
            Error::EmptyCache => "empty_cache",
            Error::Io(_) => "io",
            Error::Materialize { .. } => "materialize",
        }
    }
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
