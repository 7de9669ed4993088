//! Google service account and Drive API constants
//!
//! Public endpoint and scope values. Nothing here is secret; the private key
//! lives only in the credential files.

/// `type` field every service account key file carries.
pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Token endpoint used when a key file omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Base URL of the Drive v3 REST API.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Full Drive access scope requested for every service account.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// User-Agent sent by preloaded clients.
pub const USER_AGENT: &str = concat!("sa-rotator/", env!("CARGO_PKG_VERSION"));
