//! Axum HTTP/WebSocket surface for the HLS pipeline.
//!
//! This crate provides:
//! - Streamed upload-and-convert over WebSocket with live progress events
//! - HLS segmenting, poster extraction and WebVTT endpoints
//! - Static delivery of the artifact tree under `/stream`

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
