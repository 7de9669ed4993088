//! Service account key files
//!
//! Each credential file is a Google service account JSON key. Only the fields
//! needed to identify the account and later sign token requests are parsed;
//! unknown fields are ignored.

use std::path::{Path, PathBuf};

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{DEFAULT_TOKEN_URI, SERVICE_ACCOUNT_TYPE};
use crate::error::{Error, Result};

/// Parsed service account key.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Always "service_account" for usable keys
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    /// PEM-encoded RSA key used to sign JWT assertions
    pub private_key: Secret<String>,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parse and validate a key from its JSON text.
    pub fn from_json(contents: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(contents)
            .map_err(|e| Error::CredentialParse(format!("parsing service account key: {e}")))?;
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<()> {
        if self.key_type != SERVICE_ACCOUNT_TYPE {
            return Err(Error::InvalidCredentials(format!(
                "expected type {SERVICE_ACCOUNT_TYPE:?}, got {:?}",
                self.key_type
            )));
        }
        if self.client_email.trim().is_empty() {
            return Err(Error::InvalidCredentials("client_email is empty".into()));
        }
        if self.private_key.is_empty() {
            return Err(Error::InvalidCredentials("private_key is empty".into()));
        }
        Ok(())
    }
}

/// Read and parse the key file at `path` after shell-style expansion
/// (see [`expand_path`]).
pub async fn read_key(path: &str) -> Result<ServiceAccountKey> {
    let resolved = expand_path(path);
    let contents = tokio::fs::read_to_string(&resolved)
        .await
        .map_err(|e| Error::Io(format!("opening service account file {}: {e}", resolved.display())))?;
    let key = ServiceAccountKey::from_json(&contents)?;
    debug!(path = %resolved.display(), client_email = key.client_email, "read service account key");
    Ok(key)
}

/// Expand a leading `~`, then `$VAR` and `${VAR}` references. Unset
/// variables expand to nothing.
pub fn expand_path(path: &str) -> PathBuf {
    let home_expanded = expand_home(path);
    PathBuf::from(expand_vars(&home_expanded.to_string_lossy(), |name| {
        std::env::var(name).ok()
    }))
}

/// Replace `$NAME` and `${NAME}` using `lookup`. A `$` not followed by a
/// name, or an unterminated `${`, is kept as is.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let is_name = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                }
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
            continue;
        }

        let len = after.find(|c: char| !is_name(c)).unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~` or `~/` to the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => Path::new(path).to_path_buf(),
    }
}
