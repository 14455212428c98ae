//! Poster extraction endpoint.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::handlers::OutputData;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PosterRequest {
    pub video: String,
    pub timestamp: String,
}

/// `POST /poster` - extract a single poster frame at the given timestamp.
pub async fn create_poster(
    State(state): State<AppState>,
    Json(req): Json<PosterRequest>,
) -> ApiResult<Json<OutputData>> {
    let poster = state
        .pipeline
        .poster_frame(Path::new(&req.video), &req.timestamp)
        .await?;

    info!("Poster written to {}", poster.display());

    Ok(Json(OutputData {
        message: format!("Poster for {} at {}", req.video, req.timestamp),
        status: 200,
        url: req.video,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let req: PosterRequest =
            serde_json::from_str(r#"{"video":"clip.mp4","timestamp":"00:00:05"}"#).unwrap();
        assert_eq!(req.video, "clip.mp4");
        assert_eq!(req.timestamp, "00:00:05");
    }
}
