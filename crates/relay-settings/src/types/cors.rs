//! Cross-origin policy settings.

use serde::{Deserialize, Serialize};

/// Origin allow-list and CORS response policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsSettings {
    /// Exact origins allowed to connect. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Methods advertised on HTTP routes.
    pub allowed_methods: Vec<String>,
    /// Request headers advertised on HTTP routes.
    pub allowed_headers: Vec<String>,
    /// Whether `Access-Control-Allow-Credentials: true` is sent.
    pub allow_credentials: bool,
    /// Accept WebSocket upgrades that carry no `Origin` header
    /// (non-browser clients).
    pub allow_missing_origin: bool,
}

impl CorsSettings {
    /// Whether the allow-list contains the `"*"` wildcard.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["Content-Type".to_string()],
            allow_credentials: true,
            allow_missing_origin: true,
        }
    }
}
