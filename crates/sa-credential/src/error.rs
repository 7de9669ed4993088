//! Error types for credential loading and client construction

/// Errors from reading key files and building clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;
