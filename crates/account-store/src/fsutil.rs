//! Atomic state-file persistence
//!
//! Writes serialized store state to a temporary file in the same
//! directory, then renames it over the target. This prevents corruption
//! if the process crashes mid-write. Files are created with 0600
//! permissions since they contain account data and token material.

use std::path::Path;

use account_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Load store state from `path`, or initialize the file with the default
/// state if it doesn't exist (cold start with zero records).
pub(crate) async fn load_or_init<T>(path: &Path, label: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    if path.exists() {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Storage(format!("reading {label} file: {e}")))?;
        let state: T = serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("parsing {label} file: {e}")))?;
        info!(path = %path.display(), "loaded {label} state");
        Ok(state)
    } else {
        info!(path = %path.display(), "{label} file not found, starting empty");
        let state = T::default();
        // Create the empty file so future loads don't need the cold-start path
        write_atomic(path, &state, label).await?;
        Ok(state)
    }
}

/// Write store state to a file atomically with 0600 permissions.
pub(crate) async fn write_atomic<T: Serialize>(path: &Path, state: &T, label: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| Error::Storage(format!("serializing {label} state: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage(format!("{label} path has no parent directory")))?;

    let tmp_path = dir.join(format!(".{label}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Storage(format!("writing temp {label} file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Storage(format!("setting {label} file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("renaming temp {label} file: {e}")))?;

    debug!(path = %path.display(), "persisted {label} state");
    Ok(())
}
