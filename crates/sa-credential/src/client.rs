//! Client construction from service account key files
//!
//! `KeyFileMaterializer` is the pool's [`Materializer`]: it reads a key file,
//! builds an HTTP client for the Drive API, and pairs it with a `DriveHandle`
//! naming the account. Token minting happens in the sync engine that consumes
//! the handle, not here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sa_pool::{MaterializeFuture, Materializer};
use tracing::debug;

use crate::constants::{DRIVE_API_BASE, DRIVE_SCOPE, USER_AGENT};
use crate::error::{Error, Result};
use crate::key::{ServiceAccountKey, read_key};

/// Typed handle for the Drive API bound to one service account.
#[derive(Debug, Clone)]
pub struct DriveHandle {
    /// Path of the key file this handle was built from
    pub identifier: Arc<str>,
    pub client_email: Arc<str>,
    pub project_id: Arc<str>,
    pub token_uri: Arc<str>,
    pub api_base: Arc<str>,
    pub scope: &'static str,
    key: Arc<ServiceAccountKey>,
}

impl DriveHandle {
    fn new(identifier: &str, key: ServiceAccountKey, api_base: &str) -> Self {
        Self {
            identifier: Arc::from(identifier),
            client_email: Arc::from(key.client_email.as_str()),
            project_id: Arc::from(key.project_id.as_str()),
            token_uri: Arc::from(key.token_uri.as_str()),
            api_base: Arc::from(api_base),
            scope: DRIVE_SCOPE,
            key: Arc::new(key),
        }
    }

    /// The parsed key, for signing token assertions.
    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Absolute URL for a Drive API path such as `files`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builds `(reqwest::Client, DriveHandle)` pairs from key files.
#[derive(Debug, Clone)]
pub struct KeyFileMaterializer {
    timeout: Duration,
    api_base: String,
}

impl KeyFileMaterializer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            api_base: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point handles at a different API base (e.g. a local test server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Read `identifier` and build its client pair.
    pub async fn build(&self, identifier: &str) -> Result<(reqwest::Client, DriveHandle)> {
        let key = read_key(identifier).await?;
        let client = build_client(&key, self.timeout)?;
        debug!(identifier, client_email = key.client_email, "built drive client");
        Ok((client, DriveHandle::new(identifier, key, &self.api_base)))
    }
}

impl Materializer for KeyFileMaterializer {
    type Client = reqwest::Client;
    type Service = DriveHandle;

    fn materialize<'a>(
        &'a self,
        identifier: &'a str,
    ) -> MaterializeFuture<'a, reqwest::Client, DriveHandle> {
        Box::pin(async move {
            self.build(identifier)
                .await
                .map_err(|e| sa_pool::Error::Materialize {
                    identifier: identifier.to_string(),
                    reason: e.to_string(),
                })
        })
    }
}

/// HTTP client for one account: fixed timeout, user agent, and a header
/// naming the account so upstream logs can be correlated.
fn build_client(key: &ServiceAccountKey, timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let account = HeaderValue::from_str(&key.client_email)
        .map_err(|e| Error::InvalidCredentials(format!("client_email is not a valid header: {e}")))?;
    headers.insert(HeaderName::from_static("x-goog-service-account"), account);

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Http(format!("building client: {e}")))
}
