//! Credential directory scanning

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// File extension that marks a service account credential file.
pub const CREDENTIAL_EXTENSION: &str = "json";

/// List the credential files in `dir` as full paths, sorted by file name.
///
/// Entries without the credential extension are ignored.
pub async fn scan_credentials(dir: &Path) -> Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::Io(format!("reading {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| Error::Io(format!("reading {}: {e}", dir.display())))?
    {
        let path = entry.path();
        if path
            .extension()
            .is_some_and(|ext| ext == CREDENTIAL_EXTENSION)
        {
            files.push(path.to_string_lossy().into_owned());
        }
    }
    files.sort();

    debug!(dir = %dir.display(), files = files.len(), "scanned credential directory");
    Ok(files)
}
