//! Storage layout configuration

use std::path::PathBuf;

use crate::errors::ServiceError;
use crate::filesys::artifacts::ArtifactStore;
use crate::storage::db::Store;

/// On-disk locations used by the server
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Directory for uploaded bundle archives
    pub uploads_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(db_path: impl Into<PathBuf>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Open the bundle database
    pub fn open_store(&self) -> Result<Store, ServiceError> {
        Store::open(&self.db_path)
    }

    /// Artifact store rooted at the uploads directory
    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(self.uploads_dir.clone())
    }

    /// Setup the storage layout (create directories)
    pub async fn setup(&self) -> Result<(), ServiceError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.artifact_store().setup().await
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("app.db", "uploads")
    }
}
