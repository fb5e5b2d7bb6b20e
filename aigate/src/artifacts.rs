use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::errors::{Error, Result};
use crate::operations::OperationKind;

/// A binary result written to persistent storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Trait for artifact storage backends
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the output of an operation and return where it was written
    async fn persist(&self, kind: OperationKind, content: &[u8]) -> Result<StoredArtifact>;
}

/// Writes artifacts as `<prefix>_<epoch millis>.png` into a directory.
///
/// Two writes for the same kind within one millisecond share a filename and the later one wins.
pub struct LocalArtifactStore {
    output_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `None` when the operation kind produces no artifact.
    pub fn filename_for(kind: OperationKind, epoch_millis: i64) -> Option<String> {
        kind.artifact_prefix().map(|prefix| format!("{prefix}_{epoch_millis}.png"))
    }
}

/// Awaits `write`; if it fails, removes the partially written file at `path`.
async fn discard_on_error(path: &Path, write: impl Future<Output = io::Result<()>>) -> io::Result<()> {
    let result = write.await;
    if result.is_err() {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove partial artifact {}: {}", path.display(), e);
        }
    }
    result
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn persist(&self, kind: OperationKind, content: &[u8]) -> Result<StoredArtifact> {
        let persist_error = |path: &Path, source: std::io::Error| Error::Persist {
            path: path.to_path_buf(),
            source,
        };

        // Idempotent, safe to race with other requests
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| persist_error(&self.output_dir, e))?;

        let filename = Self::filename_for(kind, Utc::now().timestamp_millis())
            .ok_or_else(|| anyhow::anyhow!("{kind} results are not persisted"))?;
        let path = self.output_dir.join(&filename);

        let mut file = fs::File::create(&path).await.map_err(|e| persist_error(&path, e))?;
        discard_on_error(&path, async {
            file.write_all(content).await?;
            file.sync_all().await
        })
        .await
        .map_err(|e| persist_error(&path, e))?;

        info!("Saved {} artifact to {}", kind, path.display());

        Ok(StoredArtifact {
            filename,
            path,
            size: content.len(),
        })
    }
}
