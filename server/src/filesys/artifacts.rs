//! Bundle artifact storage on local disk

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::models::bundle::BundleId;

/// Bucket name reported to upload clients
pub const LOCAL_BUCKET: &str = "local";

/// Directory holding one archive file per bundle id
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory (and parents)
    pub async fn setup(&self) -> Result<(), ServiceError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn path_for(&self, bundle_id: &BundleId) -> Result<PathBuf, ServiceError> {
        bundle_id.validate_file_name()?;
        Ok(self.dir.join(bundle_id.as_str()))
    }

    /// Write the archive for `bundle_id`, replacing any previous one.
    ///
    /// Data lands in a temporary file first and is renamed into place, so a
    /// concurrent download never sees a partial archive.
    pub async fn save(&self, bundle_id: &BundleId, contents: &[u8]) -> Result<(), ServiceError> {
        let path = self.path_for(bundle_id)?;
        fs::create_dir_all(&self.dir).await?;

        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", bundle_id, uuid::Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        info!("Stored artifact {} ({} bytes)", bundle_id, contents.len());
        Ok(())
    }

    /// Archive bytes, or `None` when nothing was uploaded for `bundle_id`
    pub async fn read(&self, bundle_id: &BundleId) -> Result<Option<Vec<u8>>, ServiceError> {
        let path = self.path_for(bundle_id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the archive if present. Returns whether a file was removed.
    pub async fn delete(&self, bundle_id: &BundleId) -> Result<bool, ServiceError> {
        let path = self.path_for(bundle_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted artifact {}", bundle_id);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No artifact to delete for {}", bundle_id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, bundle_id: &BundleId) -> bool {
        match self.path_for(bundle_id) {
            Ok(path) => fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }
}
