// src/core/persistence/state_store.rs

//! Generic crash-recoverable state persistence.
//!
//! Grounded on `Component.save()`'s approach: write to a temporary file,
//! rotate the previous good copy to `.old`, then rename the new one into
//! place, so a crash mid-write never destroys the last good state. The
//! original pickles; here we use JSON as a data-only serialization format.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

#[derive(Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(spool_dir: &str, component_name: &str) -> Self {
        Self { path: Path::new(spool_dir).join(component_name) }
    }

    /// Restores state from disk if present, returning `None` on first boot.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let state = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt state file at {}", self.path.display()))?;
                info!(path = %self.path.display(), "restored persisted state");
                Ok(Some(state))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading state file {}", self.path.display())),
        }
    }

    /// Persists `state`, rotating the previous file to `.old` first so a
    /// crash between the rename and the next save still leaves a readable
    /// backup (mirrors `Component.save`'s write-rename-plus-backup).
    pub async fn save<T: Serialize + Sync>(&self, state: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.ok();
        }
        let tmp_path = self.path.with_extension("tmp");
        let old_path = self.path.with_extension("old");

        let serialized = serde_json::to_vec_pretty(state).context("serializing component state")?;
        fs::write(&tmp_path, &serialized)
            .await
            .with_context(|| format!("writing temp state file {}", tmp_path.display()))?;

        if fs::metadata(&self.path).await.is_ok() {
            if let Err(e) = fs::rename(&self.path, &old_path).await {
                warn!(error = %e, "failed to rotate previous state file to .old");
            }
        }
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("renaming {} into place", self.path.display()))?;
        Ok(())
    }
}
