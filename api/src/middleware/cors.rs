//! Cross-origin policy

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

use crate::config::{ConfigError, CorsConfig};

/// Single configured origin, mirrored request headers
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(&config.allowed_origin)
        .map_err(|_| ConfigError::InvalidOrigin(config.allowed_origin.clone()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials))
}
