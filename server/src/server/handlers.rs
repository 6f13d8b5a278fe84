//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, Uri},
    response::IntoResponse,
    Json,
};
use openapi_server::models::{
    BundleBody, DeleteBundleRequest, HealthResponse, SuccessResponse, UpdateInfo,
    UploadBundleResponse, VersionResponse,
};
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::filesys::artifacts::LOCAL_BUCKET;
use crate::models::bundle::{Bundle, BundleId, Platform, DEFAULT_CHANNEL};
use crate::models::report::ClientReport;
use crate::resolve::engine::Decision;
use crate::server::state::ServerState;
use crate::utils::version_info;

pub const PLATFORM_HEADER: &str = "x-app-platform";
pub const APP_VERSION_HEADER: &str = "x-app-version";
pub const BUNDLE_ID_HEADER: &str = "x-bundle-id";
pub const MIN_BUNDLE_ID_HEADER: &str = "x-min-bundle-id";
pub const CHANNEL_HEADER: &str = "x-channel";

/// Run store-backed work on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ServiceError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
            .map_err(|_| ServiceError::ValidationError(format!("Header {name} is not valid text"))),
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ServiceError> {
    header_str(headers, name)?
        .ok_or_else(|| ServiceError::ValidationError(format!("Missing header {name}")))
}

/// Build a [`ClientReport`] from check-in headers
pub fn report_from_headers(headers: &HeaderMap) -> Result<ClientReport, ServiceError> {
    let platform: Platform = required_header(headers, PLATFORM_HEADER)?.parse()?;
    let app_version = required_header(headers, APP_VERSION_HEADER)?;
    let bundle_id = required_header(headers, BUNDLE_ID_HEADER)?;

    let mut report = ClientReport::new(platform, bundle_id).with_app_version(app_version);
    if let Some(min_bundle_id) = header_str(headers, MIN_BUNDLE_ID_HEADER)? {
        report = report.with_min_bundle_id(min_bundle_id);
    }
    report = report.with_channel(header_str(headers, CHANNEL_HEADER)?.unwrap_or(DEFAULT_CHANNEL));
    Ok(report)
}

/// Request origin: the `Host` header, else the URI authority (HTTP/2 `:authority`)
fn host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "otahub".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Check-in handler. Answers `null` when the client should do nothing.
pub async fn check_update_handler(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Option<UpdateInfo>>, ServiceError> {
    let report = report_from_headers(&headers)?;

    let engine = state.engine.clone();
    let decision = blocking(move || engine.check(&report)).await?;

    let Some(status) = decision.status() else {
        return Ok(Json(None));
    };
    let id = decision.target_id().unwrap_or_default();
    let file_url = match &decision {
        Decision::Update { .. } | Decision::Rollback { .. } => {
            Some(state.locator.file_url(&id, host(&headers, &uri))?)
        }
        Decision::NoAction | Decision::ResetToBase => None,
    };

    Ok(Json(Some(UpdateInfo {
        id: id.to_string(),
        should_force_update: decision.should_force_update(),
        message: decision.message().map(str::to_string),
        status,
        file_url,
    })))
}

/// Artifact upload handler (multipart: `bundleId`, `file`)
pub async fn upload_bundle_handler(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadBundleResponse>, ServiceError> {
    let mut bundle_id: Option<BundleId> = None;
    let mut contents: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("bundleId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::ValidationError(format!("Invalid bundleId: {e}")))?;
                bundle_id = Some(BundleId::new(text.trim()));
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::ValidationError(format!("Invalid file: {e}")))?;
                contents = Some(bytes.to_vec());
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let bundle_id = bundle_id
        .ok_or_else(|| ServiceError::ValidationError("Missing field bundleId".to_string()))?;
    let contents =
        contents.ok_or_else(|| ServiceError::ValidationError("Missing field file".to_string()))?;

    state.artifacts.save(&bundle_id, &contents).await?;

    Ok(Json(UploadBundleResponse {
        key: state.locator.file_url(&bundle_id, host(&headers, &uri))?,
        bucket_name: LOCAL_BUCKET.to_string(),
    }))
}

/// Artifact delete handler
pub async fn delete_bundle_handler(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<DeleteBundleRequest>,
) -> Result<Json<SuccessResponse>, ServiceError> {
    let bundle_id = BundleId::new(body.bundle_id);
    state.artifacts.delete(&bundle_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Artifact download handler
pub async fn file_handler(
    State(state): State<Arc<ServerState>>,
    Path(bundle_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let bundle_id = BundleId::new(bundle_id);
    let bytes = state
        .artifacts
        .read(&bundle_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("File not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// Single bundle handler
pub async fn get_bundle_handler(
    State(state): State<Arc<ServerState>>,
    Path(bundle_id): Path<String>,
) -> Result<Json<BundleBody>, ServiceError> {
    let store = state.store.clone();
    let bundle_id = BundleId::new(bundle_id);
    let bundle = blocking(move || store.get_bundle(&bundle_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Bundle not found".to_string()))?;
    Ok(Json(bundle.into()))
}

/// Bundle listing handler
pub async fn list_bundles_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<BundleBody>>, ServiceError> {
    let store = state.store.clone();
    let bundles = blocking(move || store.list_bundles()).await?;
    Ok(Json(bundles.into_iter().map(BundleBody::from).collect()))
}

/// Batch upsert handler. The batch is applied atomically.
pub async fn upsert_bundles_handler(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Vec<BundleBody>>,
) -> Result<Json<SuccessResponse>, ServiceError> {
    let bundles = body
        .into_iter()
        .map(Bundle::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let count = bundles.len();
    let store = state.store.clone();
    blocking(move || store.upsert_bundles(&bundles)).await?;
    info!("Published {} bundle(s)", count);

    Ok(Json(SuccessResponse { success: true }))
}
