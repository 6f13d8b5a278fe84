//! HTTP server setup

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::authn::secret::require_secret;
use crate::errors::ServiceError;
use crate::server::handlers::{
    check_update_handler, delete_bundle_handler, file_handler, get_bundle_handler,
    health_handler, list_bundles_handler, upload_bundle_handler, upsert_bundles_handler,
    version_handler,
};
use crate::server::state::ServerState;

/// Build the application router
pub fn router(options: &ServerOptions, state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Client check-in
        .route("/checkUpdate", get(check_update_handler))
        // Artifacts
        .route("/files/{bundleId}", get(file_handler))
        .route(
            "/uploadBundle",
            post(upload_bundle_handler)
                .layer(DefaultBodyLimit::max(options.max_upload_bytes)),
        )
        .route("/deleteBundle", post(delete_bundle_handler))
        // Bundle metadata
        .route(
            "/bundles",
            get(list_bundles_handler).post(upsert_bundles_handler),
        )
        .route("/bundles/{bundleId}", get(get_bundle_handler))
        // State and middleware
        .layer(middleware::from_fn_with_state(state.clone(), require_secret))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(options.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ServiceError>>, ServiceError> {
    let app = router(options, state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServiceError::ServerError(e.to_string()))
    });

    Ok(handle)
}
