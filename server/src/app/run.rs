//! Main application run loop

use std::future::Future;

use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::errors::ServiceError;
use crate::server::serve::serve;

/// Run the update server until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServiceError> {
    info!("Initializing update server...");

    let app_state = AppState::init(&options).await?;
    let server_state = app_state.server_state(&options);

    let handle = serve(&options.server, server_state, shutdown_signal).await?;
    let served = match handle.await {
        Ok(result) => result,
        Err(e) => Err(ServiceError::ServerError(format!("server task failed: {e}"))),
    };
    if let Err(e) = &served {
        error!("HTTP server stopped with error: {}", e);
    }

    app_state.shutdown().await?;
    info!("Update server stopped");
    served
}
