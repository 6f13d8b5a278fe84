//! Application state management

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::authn::secret::SecretGate;
use crate::errors::ServiceError;
use crate::filesys::artifacts::ArtifactStore;
use crate::server::locator::ArtifactLocator;
use crate::server::state::ServerState;
use crate::storage::db::Store;

/// Main application state
pub struct AppState {
    /// Bundle metadata store
    pub store: Arc<Store>,

    /// Uploaded artifacts
    pub artifacts: Arc<ArtifactStore>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<Self, ServiceError> {
        info!("Initializing application state...");

        let layout = &options.storage.layout;
        layout.setup().await?;

        let store = Arc::new(layout.open_store()?);
        let artifacts = Arc::new(layout.artifact_store());

        if options.secret.is_none() {
            warn!("No SECRET configured; management routes will reject every request");
        }

        Ok(Self { store, artifacts })
    }

    /// State handed to the HTTP server
    pub fn server_state(&self, options: &AppOptions) -> Arc<ServerState> {
        Arc::new(ServerState::new(
            self.store.clone(),
            self.artifacts.clone(),
            ArtifactLocator::new(options.public_base_url.clone()).with_listen_address(format!(
                "{}:{}",
                options.server.host, options.server.port
            )),
            SecretGate::new(options.secret.clone()),
        ))
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Shutting down application state...");
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            store
                .conn()
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
        })
        .await??;
        Ok(())
    }
}
