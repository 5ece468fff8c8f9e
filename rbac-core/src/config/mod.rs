use serde::Deserialize;

/// Connection settings for the remote RBAC API.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL the `/api/...` paths are appended to, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Per-request timeout. Unset means calls wait for the server indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: None,
        }
    }
}
