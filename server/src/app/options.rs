//! Application configuration options

use secrecy::SecretString;
use url::Url;

use crate::storage::layout::StorageLayout;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Server configuration
    pub server: ServerOptions,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Base URL for artifact links; the request origin when unset
    pub public_base_url: Option<Url>,

    /// Shared secret for management routes
    pub secret: Option<SecretString>,
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Largest accepted artifact upload
    pub max_upload_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            max_upload_bytes: 256 * 1024 * 1024,
        }
    }
}
