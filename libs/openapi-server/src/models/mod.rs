//! Update server API models

use serde::{Deserialize, Serialize};

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Version response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Direction of an update instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateStatus {
    Update,
    Rollback,
}

/// Body of a `/checkUpdate` response.
///
/// The endpoint answers `null` when the client should do nothing, so handlers
/// serialize an `Option<UpdateInfo>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub id: String,
    pub should_force_update: bool,
    pub message: Option<String>,
    pub status: UpdateStatus,
    pub file_url: Option<String>,
}

/// Bundle metadata as exchanged with deploy tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleBody {
    pub id: String,
    pub platform: String,
    pub target_app_version: String,
    pub should_force_update: bool,
    pub enabled: bool,
    pub file_hash: String,
    pub git_commit_hash: Option<String>,
    pub message: Option<String>,
    pub channel: String,
}

/// Artifact upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBundleResponse {
    pub bucket_name: String,
    pub key: String,
}

/// Artifact delete request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBundleRequest {
    pub bundle_id: String,
}

/// Generic mutation acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error body returned for every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
