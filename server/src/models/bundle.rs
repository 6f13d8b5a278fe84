//! Bundle models

use std::fmt;
use std::str::FromStr;

use openapi_server::models::BundleBody;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Channel used when a client does not name one
pub const DEFAULT_CHANNEL: &str = "production";

/// Native platform a bundle is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(ServiceError::ValidationError(format!(
                "Unknown platform: {other}"
            ))),
        }
    }
}

/// Time-ordered bundle identifier (UUIDv7 in practice).
///
/// Ordering is plain string ordering, which for UUIDv7 text is publication
/// order. The nil UUID is the "no bundle" sentinel and sorts below every real id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The "no bundle" sentinel
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil().to_string())
    }

    pub fn is_nil(&self) -> bool {
        self.0 == uuid::Uuid::nil().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject ids that cannot double as an artifact file name
    pub fn validate_file_name(&self) -> Result<(), ServiceError> {
        if self.0.is_empty()
            || self.0 == "."
            || self.0.contains('\0')
            || self.0.contains('/')
            || self.0.contains('\\')
            || self.0.contains("..")
        {
            return Err(ServiceError::ValidationError(format!(
                "Invalid bundle id: {:?}",
                self.0
            )));
        }
        Ok(())
    }
}

impl Default for BundleId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BundleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A published release unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: BundleId,
    pub platform: Platform,
    pub target_app_version: String,
    pub should_force_update: bool,
    pub enabled: bool,
    pub file_hash: String,
    pub git_commit_hash: Option<String>,
    pub message: Option<String>,
    pub channel: String,
}

impl TryFrom<BundleBody> for Bundle {
    type Error = ServiceError;

    fn try_from(body: BundleBody) -> Result<Self, Self::Error> {
        if body.id.is_empty() {
            return Err(ServiceError::ValidationError(
                "Bundle id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: BundleId::new(body.id),
            platform: body.platform.parse()?,
            target_app_version: body.target_app_version,
            should_force_update: body.should_force_update,
            enabled: body.enabled,
            file_hash: body.file_hash,
            git_commit_hash: body.git_commit_hash,
            message: body.message,
            channel: body.channel,
        })
    }
}

impl From<Bundle> for BundleBody {
    fn from(bundle: Bundle) -> Self {
        Self {
            id: bundle.id.0,
            platform: bundle.platform.as_str().to_string(),
            target_app_version: bundle.target_app_version,
            should_force_update: bundle.should_force_update,
            enabled: bundle.enabled,
            file_hash: bundle.file_hash,
            git_commit_hash: bundle.git_commit_hash,
            message: bundle.message,
            channel: bundle.channel,
        }
    }
}
