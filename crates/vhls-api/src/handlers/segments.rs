//! HLS segmenting endpoint.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vhls_models::Resolution;

use crate::error::{ApiError, ApiResult};
use crate::handlers::OutputData;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SegmentVideo {
    pub hash: String,
    pub name: String,
    pub resolutions: Vec<String>,
    pub id: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct SegmentsRequest {
    #[serde(rename = "videoList")]
    pub video_list: Vec<SegmentVideo>,
}

/// Delivery URL for an artifact inside a video's segment folder, with
/// the nested path flattened into a single percent-encoded object name.
fn delivery_url(segments_dir: &str, hash: &str, ext: &str, suffix: &str) -> String {
    let object = format!("{}/{}/{}.{}", segments_dir, hash, hash, ext);
    format!("/{}{}", urlencoding::encode(&object), suffix)
}

fn parse_resolutions(raw: &[String]) -> ApiResult<Vec<Resolution>> {
    raw.iter()
        .map(|s| s.parse::<Resolution>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// `POST /segments` - build poster, segmented renditions and master
/// manifest for each submitted video.
pub async fn create_segments(
    State(state): State<AppState>,
    Json(req): Json<SegmentsRequest>,
) -> ApiResult<Json<OutputData>> {
    if req.video_list.is_empty() {
        return Err(ApiError::bad_request("videoList is empty"));
    }

    let config = state.pipeline.config().clone();
    let mut url = String::new();

    for video in &req.video_list {
        let resolutions = parse_resolutions(&video.resolutions)?;
        info!(video_id = %video.id, hash = %video.hash, "Building HLS artifacts");

        let artifacts = state
            .pipeline
            .build_hls(
                Path::new(&video.name),
                &video.hash,
                &resolutions,
                &video.timestamp,
                None,
            )
            .await?;

        info!(
            "HLS build for {} produced {} playlists, master at {}",
            video.hash,
            artifacts.playlists.len(),
            artifacts.master.display()
        );

        url = delivery_url(
            &config.layout.segments_dir,
            &video.hash,
            "m3u8",
            &config.delivery_suffix,
        );
    }

    Ok(Json(OutputData {
        message: format!("Segmented {} video(s)", req.video_list.len()),
        status: 200,
        url,
    }))
}
