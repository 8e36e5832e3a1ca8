//! Cross-origin policy: the CORS layer for HTTP routes and the `Origin`
//! check applied to WebSocket upgrades.
//!
//! Browsers do not apply CORS to WebSocket handshakes, so the allow-list is
//! enforced twice: once by [`cors_layer`] for ordinary HTTP requests and once
//! by [`OriginPolicy::allows`] inside the upgrade handler.

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue, Method};
use relay_settings::CorsSettings;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{Result, ServerError};

/// Origin allow-list checked on every WebSocket upgrade.
#[derive(Clone, Debug)]
pub struct OriginPolicy {
    any: bool,
    allowed: HashSet<String>,
    allow_missing: bool,
}

impl OriginPolicy {
    /// Build the policy from settings.
    pub fn from_settings(settings: &CorsSettings) -> Self {
        Self {
            any: settings.allows_any_origin(),
            allowed: settings
                .allowed_origins
                .iter()
                .map(|o| o.trim_end_matches('/').to_string())
                .collect(),
            allow_missing: settings.allow_missing_origin,
        }
    }

    /// Whether a request carrying `origin` may open a connection.
    pub fn allows(&self, origin: Option<&HeaderValue>) -> bool {
        let Some(origin) = origin else {
            return self.allow_missing;
        };
        if self.any {
            return true;
        }
        origin
            .to_str()
            .is_ok_and(|o| self.allowed.contains(o.trim_end_matches('/')))
    }
}

/// Build the `tower-http` CORS layer for the HTTP routes.
pub fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer> {
    if settings.allows_any_origin() && settings.allow_credentials {
        return Err(ServerError::InvalidCors(
            "credentials cannot be allowed for a \"*\" origin".into(),
        ));
    }

    let origin = if settings.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins = settings
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o.trim_end_matches('/'))
                    .map_err(|_| ServerError::InvalidCors(format!("origin {o:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    let methods = settings
        .allowed_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.to_uppercase().as_bytes())
                .map_err(|_| ServerError::InvalidCors(format!("method {m:?}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let headers = settings
        .allowed_headers
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.as_bytes())
                .map_err(|_| ServerError::InvalidCors(format!("header {h:?}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(settings.allow_credentials))
}
