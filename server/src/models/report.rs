//! Client check-in report

use crate::models::bundle::{BundleId, Platform, DEFAULT_CHANNEL};

/// State a client reports when it checks for updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReport {
    pub platform: Platform,

    /// Bundle the client currently runs; nil when it runs the embedded bundle
    pub bundle_id: BundleId,

    /// Floor below which the client refuses to go
    pub min_bundle_id: BundleId,

    pub channel: String,

    /// Native app version. Carried for logging only.
    pub app_version: Option<String>,
}

impl ClientReport {
    pub fn new(platform: Platform, bundle_id: impl Into<BundleId>) -> Self {
        Self {
            platform,
            bundle_id: bundle_id.into(),
            min_bundle_id: BundleId::nil(),
            channel: DEFAULT_CHANNEL.to_string(),
            app_version: None,
        }
    }

    pub fn with_min_bundle_id(mut self, min_bundle_id: impl Into<BundleId>) -> Self {
        self.min_bundle_id = min_bundle_id.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }
}
