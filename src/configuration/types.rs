use std::time::Duration;

/// Rackspace Cloud Files authentication endpoint (US).
pub const US_AUTH_URL: &str = "https://auth.api.rackspacecloud.com/v1.0";

/// Rackspace Cloud Files authentication endpoint (UK).
pub const UK_AUTH_URL: &str = "https://lon.auth.api.rackspacecloud.com/v1.0";

pub const DEFAULT_ROTATE_COUNT: i64 = 7;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, PartialEq, Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

/// How to reach the storage service once authenticated.
#[derive(Debug, PartialEq, Clone)]
pub struct ConnectionOptions {
    pub auth_url: String,
    pub servicenet: bool,
    /// Connect and request timeout; for uploads, the longest pause in progress.
    pub timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            auth_url: US_AUTH_URL.to_string(),
            servicenet: false,
            timeout: REQUEST_TIMEOUT,
        }
    }
}
