//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Rendition claim held by another run: {0}")]
    ClaimHeld(String),

    #[error("Progress channel closed")]
    ChannelClosed,

    #[error("Invalid resolution: {0}")]
    Resolution(#[from] vhls_models::ResolutionError),

    #[error("Media error: {0}")]
    Media(#[from] vhls_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<vhls_media::SinkClosed> for PipelineError {
    fn from(_: vhls_media::SinkClosed) -> Self {
        Self::ChannelClosed
    }
}
