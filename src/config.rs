//! Configuration types for the API client.
//!
//! This module provides a serializable configuration structure that can be
//! loaded from external config files or environment variables.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::dispatcher::{DEFAULT_SCHEME, DEFAULT_TIMEOUT};

/// Settings needed to build a [`Client`](crate::Client).
///
/// # Example
///
/// ```rust
/// use algoliasearch::ClientConfig;
/// use serde_json::json;
///
/// let config: ClientConfig = serde_json::from_value(json!({
///     "application_id": "YourApplicationID",
///     "api_key": "YourAPIKey"
/// }))
/// .unwrap();
///
/// assert!(config.hosts.is_empty());
/// assert_eq!(config.timeout_seconds, 30);
/// assert_eq!(config.scheme, "https");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application id from the dashboard
    pub application_id: String,
    /// API key for authentication (not serialized for security)
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Candidate hosts; when empty the three default hosts of the application are used
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// URL scheme for every host
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl ClientConfig {
    pub fn new(application_id: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: Some(api_key),
            hosts: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            scheme: default_scheme(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// The three hosts every application is reachable on.
pub fn default_hosts(application_id: &str) -> Vec<String> {
    (1..=3)
        .map(|n| format!("{application_id}-{n}.algolia.io"))
        .collect()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}
