//! HTTP request handlers.

pub mod health;
pub mod poster;
pub mod segments;
pub mod vtt;

use serde::Serialize;

/// Response body shared by the JSON endpoints.
#[derive(Debug, Serialize)]
pub struct OutputData {
    pub message: String,
    pub status: u16,
    pub url: String,
}
