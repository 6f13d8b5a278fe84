//! Artifact URL construction

use url::Url;

use crate::errors::ServiceError;
use crate::models::bundle::BundleId;

/// Maps bundle ids to download URLs served by `/files/{bundleId}`
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocator {
    public_base_url: Option<Url>,
    listen_address: Option<String>,
}

impl ArtifactLocator {
    /// `public_base_url` overrides the request origin, e.g. behind a proxy
    pub fn new(public_base_url: Option<Url>) -> Self {
        Self {
            public_base_url,
            listen_address: None,
        }
    }

    /// `host:port` used when a request carries no origin at all
    pub fn with_listen_address(mut self, address: impl Into<String>) -> Self {
        self.listen_address = Some(address.into());
        self
    }

    /// Download URL for `bundle_id`. Without a configured base URL the
    /// request origin is used, then the listen address.
    pub fn file_url(&self, bundle_id: &BundleId, host: Option<&str>) -> Result<String, ServiceError> {
        let mut base = match &self.public_base_url {
            Some(url) => url.clone(),
            None => {
                let host = host
                    .or(self.listen_address.as_deref())
                    .ok_or_else(|| ServiceError::ValidationError("Missing Host header".to_string()))?;
                Url::parse(&format!("http://{host}"))
                    .map_err(|e| ServiceError::ValidationError(format!("Invalid Host header: {e}")))?
            }
        };

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let url = base
            .join(&format!("files/{}", bundle_id))
            .map_err(|e| ServiceError::Internal(format!("Invalid file URL: {e}")))?;
        Ok(url.to_string())
    }
}
