//! On-disk storage layout for uploads and produced artifacts.
//!
//! Everything lives under one configurable root: `temp/` holds uploaded
//! inputs awaiting (or undergoing) processing, `output/` holds toolbox
//! artifacts. Also provides the aged-file sweep used by the retention
//! task.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::CoreError;
use crate::job::JobId;

/// Subdirectory for uploaded inputs.
pub const TEMP_DIR: &str = "temp";

/// Subdirectory for toolbox outputs.
pub const OUTPUT_DIR: &str = "output";

/// Resolved storage layout rooted at a single directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Create the temp and output directories if they do not exist.
    pub async fn ensure_dirs(&self) -> Result<(), CoreError> {
        for dir in [self.temp_dir(), self.output_dir()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                CoreError::Internal(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }

    /// Path for a persisted upload, namespaced by job id so concurrent
    /// uploads of the same filename never collide.
    pub fn upload_path(&self, job_id: JobId, filename: &str) -> PathBuf {
        self.temp_dir()
            .join(format!("{job_id}_{}", sanitize_filename(filename)))
    }

    /// Path for a toolbox artifact in the output directory.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir().join(sanitize_filename(filename))
    }
}

/// Strip path separators and parent references from a client-supplied
/// filename, keeping only the final component.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() || name == ".." || name == "." {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

/// Delete regular files under `dir` whose modification time is older
/// than `max_age`. Returns the number of files removed.
///
/// Unreadable entries and failed deletions are logged and skipped; the
/// sweep never aborts part-way.
pub async fn sweep_aged_files(dir: &Path, max_age: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Retention sweep: cannot read directory");
            return 0;
        }
    };

    let cutoff = SystemTime::now() - max_age;
    let mut removed = 0;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Retention sweep: removed aged file");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Retention sweep: delete failed");
            }
        }
    }

    removed
}
