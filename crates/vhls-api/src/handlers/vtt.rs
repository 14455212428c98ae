//! WebVTT chapter endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vhls_models::Chapter;

use crate::error::ApiResult;
use crate::handlers::OutputData;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VttRequest {
    pub chapters: Vec<Chapter>,
    pub id: String,
    pub hash: String,
}

/// `POST /vttfile` - write chapter cues as WebVTT into the video's
/// segment folder.
pub async fn create_vtt(
    State(state): State<AppState>,
    Json(req): Json<VttRequest>,
) -> ApiResult<Json<OutputData>> {
    let path = state.pipeline.write_chapters(&req.hash, &req.chapters).await?;

    info!(video_id = %req.id, "WebVTT written to {}", path.display());

    Ok(Json(OutputData {
        message: format!("WebVTT created with {} cue(s)", req.chapters.len()),
        status: 200,
        url: String::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = r#"{
            "chapters": [{"start": "00:00:00.000", "end": "00:00:05.000", "text": "Intro"}],
            "id": "doc1",
            "hash": "abc123"
        }"#;
        let req: VttRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.chapters.len(), 1);
        assert_eq!(req.chapters[0].text, "Intro");
    }
}
