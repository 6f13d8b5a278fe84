//! Server state

use std::sync::Arc;

use crate::authn::secret::SecretGate;
use crate::filesys::artifacts::ArtifactStore;
use crate::resolve::engine::UpdateEngine;
use crate::server::locator::ArtifactLocator;
use crate::storage::db::Store;

/// Server state shared across handlers
pub struct ServerState {
    pub store: Arc<Store>,
    pub engine: Arc<UpdateEngine<Arc<Store>>>,
    pub artifacts: Arc<ArtifactStore>,
    pub locator: ArtifactLocator,
    pub gate: SecretGate,
}

impl ServerState {
    pub fn new(
        store: Arc<Store>,
        artifacts: Arc<ArtifactStore>,
        locator: ArtifactLocator,
        gate: SecretGate,
    ) -> Self {
        Self {
            engine: Arc::new(UpdateEngine::new(store.clone())),
            store,
            artifacts,
            locator,
            gate,
        }
    }
}
