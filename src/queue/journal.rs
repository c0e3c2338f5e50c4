//! Queue journal
//!
//! Whole-queue JSON snapshots written atomically (temp file + rename).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::operation::{DeadLetter, PendingOperation};
use crate::error::{OfflineError, Result};

const FORMAT_VERSION: u32 = 1;

/// Persisted form of the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalSnapshot {
    pub format: u32,
    pub next_seq: u64,
    pub operations: Vec<PendingOperation>,
    #[serde(default)]
    pub dead_letters: Vec<DeadLetter>,
}

#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last snapshot; `None` when nothing was written yet.
    pub async fn load(&self) -> Result<Option<JournalSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let snapshot: JournalSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            OfflineError::Corrupted(format!("{}: {}", self.path.display(), e))
        })?;
        if snapshot.format != FORMAT_VERSION {
            return Err(OfflineError::Corrupted(format!(
                "{}: unsupported format {}",
                self.path.display(),
                snapshot.format
            )));
        }
        Ok(Some(snapshot))
    }

    /// Replaces the journal with `snapshot`; readers see the old or the new
    /// file, never a partial one.
    pub async fn write(&self, snapshot: &JournalSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(&JournalSnapshot {
            format: FORMAT_VERSION,
            ..snapshot.clone()
        })
        .map_err(|e| OfflineError::Corrupted(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            "Journal written: {} operations, {} bytes",
            snapshot.operations.len(),
            bytes.len()
        );
        Ok(())
    }
}
