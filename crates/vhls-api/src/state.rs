//! Application state.

use std::sync::Arc;

use vhls_pipeline::{PipelineConfig, TranscodePipeline};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<TranscodePipeline>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline_config: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: Arc::new(TranscodePipeline::new(pipeline_config)),
        }
    }
}
