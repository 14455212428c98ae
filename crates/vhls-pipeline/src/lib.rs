//! Transcode/segment orchestration.
//!
//! This crate drives one request's pipeline run: probe + hash once per
//! source, then a sequential per-resolution loop of encoder subprocesses
//! with progress reported to a caller-owned sink, followed by master
//! manifest assembly. A claim registry keyed by content hash + resolution
//! serializes concurrent duplicate submissions.

pub mod claims;
pub mod config;
pub mod error;
pub mod pipeline;

pub use claims::{ClaimGuard, ClaimRegistry};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{HlsArtifacts, RenditionOutcome, TranscodePipeline};
