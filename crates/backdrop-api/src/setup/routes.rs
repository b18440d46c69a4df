//! Route configuration and setup

mod health;

use crate::constants::{BODY_LIMIT_OVERHEAD_BYTES, CHANGE_BG_PATH, OPENAPI_PATH, REMOVE_BG_PATH};
use crate::handlers;
use crate::middleware::{request_id_middleware, RequestId};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request},
    routing::{get, post},
    Json, Router,
};
use backdrop_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = request_body_limit(config);

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit,
        body_limit,
        "HTTP limits configured"
    );

    let app = public_routes()
        .merge(background_routes(body_limit))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Largest accepted request body.
///
/// The JSON surface carries base64, which inflates the upload by 4/3.
fn request_body_limit(config: &Config) -> usize {
    config
        .max_upload_size_bytes()
        .saturating_mul(4)
        .div_ceil(3)
        .saturating_add(BODY_LIMIT_OVERHEAD_BYTES)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Probes and the OpenAPI document
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Background removal and replacement
fn background_routes(body_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(REMOVE_BG_PATH, post(handlers::remove_bg::remove_background))
        .route(CHANGE_BG_PATH, post(handlers::change_bg::change_background))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(move |key| map.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_body_limit_covers_base64_payload() {
        let config = config_from(&[("MAX_UPLOAD_SIZE_MB", "3")]);
        let limit = request_body_limit(&config);
        assert_eq!(limit, 4 * 1024 * 1024 + BODY_LIMIT_OVERHEAD_BYTES);
    }

    #[test]
    fn test_setup_cors_rejects_invalid_origin() {
        let config = config_from(&[("CORS_ORIGINS", "https://ok.example,bad\norigin")]);
        assert!(setup_cors(&config).is_err());
    }

    #[test]
    fn test_setup_cors_accepts_listed_origins() {
        let config = config_from(&[("CORS_ORIGINS", "https://a.example,https://b.example")]);
        assert!(setup_cors(&config).is_ok());
    }
}
