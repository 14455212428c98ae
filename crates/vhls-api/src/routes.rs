//! API routes.

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, poster, segments, vtt};
use crate::state::AppState;
use crate::ws;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/segments", post(segments::create_segments))
        .route("/poster", post(poster::create_poster))
        .route("/vttfile", post(vtt::create_vtt))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size));

    let ws_routes = Router::new()
        .route("/convert", get(ws::convert))
        .route("/upload", get(ws::upload));

    // artifact tree served read-only under /stream
    let stream_root = state.pipeline.config().artifact_root.clone();

    Router::new()
        .merge(api_routes)
        .merge(ws_routes)
        .route("/health", get(health::health))
        .nest_service("/stream", ServeDir::new(stream_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}
