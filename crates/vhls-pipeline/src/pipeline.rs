//! Per-request pipeline driver.
//!
//! One request processes its resolution list sequentially, one encoder
//! subprocess at a time, to bound CPU/IO pressure from ffmpeg. Concurrent
//! requests for different sources each run their own sequential loop at
//! the transport layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::Utc;
use tokio::fs;
use tokio::sync::watch;
use tracing::{info, warn};

use vhls_media::{
    build_segments, extract_frame_strip, extract_poster, hash_file, probe_source,
    rewrite_playlist, transcode_rendition, write_master_manifest, write_vtt, FfmpegRunner,
    ProgressSink, RewriteRules,
};
use vhls_models::{Chapter, Resolution, TranscodeProgress, UploadRecord, VideoRecord};

use crate::claims::ClaimRegistry;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// How one rendition's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenditionOutcome {
    /// The encoder produced a fresh artifact
    Encoded(PathBuf),
    /// An artifact with the deterministic name already existed; the
    /// encoder was not re-invoked
    Reused(PathBuf),
}

impl RenditionOutcome {
    pub fn path(&self) -> &Path {
        match self {
            RenditionOutcome::Encoded(p) | RenditionOutcome::Reused(p) => p,
        }
    }
}

/// Artifacts produced by one HLS build.
#[derive(Debug, Clone)]
pub struct HlsArtifacts {
    /// Content hash keying the segment folder
    pub hash: String,
    /// Master manifest path
    pub master: PathBuf,
    /// Extracted poster path
    pub poster: PathBuf,
    /// Per-resolution index playlists, in submission order
    pub playlists: Vec<(Resolution, PathBuf)>,
}

/// Drives probe + hash + encode + manifest for one source.
#[derive(Debug, Clone)]
pub struct TranscodePipeline {
    config: PipelineConfig,
    claims: ClaimRegistry,
}

impl TranscodePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            claims: ClaimRegistry::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Deterministic rendition output path for a source hash + resolution.
    pub fn rendition_path(&self, hash: &str, resolution: Resolution) -> PathBuf {
        self.config
            .output_dir()
            .join(format!("{}_{}.mp4", hash, resolution.file_suffix()))
    }

    fn runner(&self, cancel: Option<watch::Receiver<bool>>) -> FfmpegRunner {
        let mut runner = FfmpegRunner::new();
        if let Some(rx) = cancel {
            runner = runner.with_cancel(rx);
        }
        if let Some(secs) = self.config.job_timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner
    }

    fn rewrite_rules(&self) -> RewriteRules {
        RewriteRules::new(
            format!("{}/", self.config.layout.segments_dir),
            self.config.delivery_suffix.clone(),
        )
        .with_local_root(self.config.artifact_root.to_string_lossy())
    }

    /// The root-qualified ffmpeg output prefix for one segmented
    /// rendition. The playlist lands at `<prefix>.m3u8`.
    fn segment_prefix(&self, hash: &str, resolution: Resolution) -> String {
        self.config
            .segment_dir(hash)
            .join(format!("{}_{}_", hash, resolution.height))
            .to_string_lossy()
            .into_owned()
    }

    /// Transcode `input` into one full rendition per resolution,
    /// sequentially, pushing progress to `sink`.
    ///
    /// Each resolution is an independently failable unit: its failure is
    /// reported as a terminal event and the loop continues. Probe or hash
    /// failure aborts the whole run before any encoder spawns. A closed
    /// sink or a cancellation aborts the run; there is no one left to
    /// report to.
    pub async fn transcode_renditions(
        &self,
        input: &Path,
        resolutions: &[Resolution],
        sink: Arc<dyn ProgressSink>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PipelineResult<Vec<RenditionOutcome>> {
        let source = probe_source(input).await?;
        let hash = hash_file(input).await?;

        fs::create_dir_all(self.config.output_dir()).await?;

        info!(
            "Transcoding {} resolutions of {} (hash {})",
            resolutions.len(),
            input.display(),
            hash
        );

        let total = resolutions.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, &resolution) in resolutions.iter().enumerate() {
            let run = self
                .run_rendition(
                    input,
                    &hash,
                    resolution,
                    index,
                    total,
                    source.duration,
                    Arc::clone(&sink),
                    cancel.clone(),
                )
                .await;

            match run {
                Ok(outcome) => {
                    let record =
                        VideoRecord::for_rendition(&hash, resolution.width, resolution.height);
                    info!("Rendition ready: {}", record.name);
                    sink.send(TranscodeProgress::completed(resolution, index, total))
                        .await?;
                    outcomes.push(outcome);
                }
                Err(PipelineError::ChannelClosed) => return Err(PipelineError::ChannelClosed),
                Err(PipelineError::Media(vhls_media::MediaError::Cancelled)) => {
                    return Err(vhls_media::MediaError::Cancelled.into());
                }
                Err(e) => {
                    warn!("Rendition {} failed: {}", resolution, e);
                    sink.send(TranscodeProgress::failed(
                        resolution,
                        index,
                        total,
                        e.to_string(),
                    ))
                    .await?;
                }
            }
        }

        Ok(outcomes)
    }

    /// Run a single rendition under its claim.
    ///
    /// The claim spans the existence check and the encode, so a
    /// concurrent duplicate submission fails fast with `ClaimHeld`
    /// instead of racing the check. An existing artifact short-circuits
    /// without re-invoking the encoder.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_rendition(
        &self,
        input: &Path,
        hash: &str,
        resolution: Resolution,
        index: usize,
        total: usize,
        duration_secs: f64,
        sink: Arc<dyn ProgressSink>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PipelineResult<RenditionOutcome> {
        let key = format!("{}_{}", hash, resolution.file_suffix());
        let output = self.rendition_path(hash, resolution);

        let _claim = self
            .claims
            .try_claim(&key)
            .ok_or_else(|| PipelineError::ClaimHeld(key.clone()))?;

        if fs::try_exists(&output).await? {
            info!("Rendition already present, skipping encode: {}", output.display());
            return Ok(RenditionOutcome::Reused(output));
        }

        let runner = self.runner(cancel);
        transcode_rendition(
            input,
            &output,
            resolution,
            index,
            total,
            duration_secs,
            &runner,
            sink,
        )
        .await?;

        Ok(RenditionOutcome::Encoded(output))
    }

    /// Build the HLS artifact set for a source: poster, one segmented
    /// rendition per resolution, and the master manifest referencing the
    /// playlists that were actually produced, in submission order.
    ///
    /// The content hash is claimed for the whole build, so a concurrent
    /// duplicate submission fails fast with `ClaimHeld`. An existing
    /// poster or playlist is reused without re-invoking the encoder.
    pub async fn build_hls(
        &self,
        input: &Path,
        hash: &str,
        resolutions: &[Resolution],
        poster_timestamp: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PipelineResult<HlsArtifacts> {
        let _claim = self
            .claims
            .try_claim(hash)
            .ok_or_else(|| PipelineError::ClaimHeld(hash.to_string()))?;

        let folder = self.config.segment_dir(hash);
        fs::create_dir_all(&folder).await?;

        let runner = self.runner(cancel.clone());
        let rules = self.rewrite_rules();

        let poster_path = folder.join(format!("{}.jpg", hash));
        let poster = if fs::try_exists(&poster_path).await? {
            info!("Poster already present: {}", poster_path.display());
            poster_path
        } else {
            extract_poster(input, &folder, poster_timestamp, hash, &runner).await?
        };

        let mut entries = Vec::with_capacity(resolutions.len());
        let mut playlists = Vec::with_capacity(resolutions.len());

        for &resolution in resolutions {
            let prefix = self.segment_prefix(hash, resolution);
            let existing = PathBuf::from(format!("{}.m3u8", prefix));

            let built = if fs::try_exists(&existing).await? {
                info!(
                    "Segment playlist already present, skipping encode: {}",
                    existing.display()
                );
                Ok(existing)
            } else {
                build_segments(input, &prefix, resolution, &self.config.encoding, &runner).await
            };

            match built {
                Ok(playlist) => {
                    rewrite_playlist(&playlist, &rules).await?;
                    entries.push((
                        resolution,
                        format!(
                            "{}/{}/{}_{}_.m3u8{}",
                            self.config.layout.segments_dir,
                            hash,
                            hash,
                            resolution.height,
                            self.config.delivery_suffix
                        ),
                    ));
                    playlists.push((resolution, playlist));
                }
                Err(e) => {
                    // one broken rendition does not sink the build; it is
                    // simply absent from the master manifest
                    warn!("Segmenting {} failed: {}", resolution, e);
                }
            }
        }

        let master = folder.join(format!("{}.m3u8", hash));
        write_master_manifest(&master, &entries, self.config.bandwidth, &rules).await?;

        Ok(HlsArtifacts {
            hash: hash.to_string(),
            master,
            poster,
            playlists,
        })
    }

    /// Extract a single poster frame into the shared posters folder.
    pub async fn poster_frame(&self, input: &Path, timestamp: &str) -> PipelineResult<PathBuf> {
        let runner = self.runner(None);
        let path = extract_poster(
            input,
            self.config.posters_dir(),
            timestamp,
            "poster",
            &runner,
        )
        .await?;
        Ok(path)
    }

    /// Preprocess a fresh upload: thumbnail frame strip, content hash and
    /// aspect ratio, assembled into an `UploadRecord` for the metadata
    /// store.
    pub async fn preprocess_upload(
        &self,
        input: &Path,
        account: &str,
        folder: &str,
    ) -> PipelineResult<UploadRecord> {
        let thumbs_dir = self.config.thumbs_dir(folder);

        let runner = self.runner(None);
        extract_frame_strip(input, &thumbs_dir, &runner).await?;

        let hash = hash_file(input).await?;
        let source = probe_source(input).await?;

        let thumbs = vhls_media::fs_utils::list_files(&thumbs_dir)
            .await?
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        let extname = input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let now = Utc::now();
        Ok(UploadRecord {
            account: account.to_string(),
            name: hash,
            extname,
            folder: folder.to_string(),
            thumbs,
            created: now,
            updated: now,
            ratio: source.aspect_ratio,
        })
    }

    /// Write a video's chapter cues as WebVTT into its segment folder.
    pub async fn write_chapters(
        &self,
        hash: &str,
        chapters: &[Chapter],
    ) -> PipelineResult<PathBuf> {
        let path = self.config.segment_dir(hash).join(format!("{}.vtt", hash));
        write_vtt(chapters, &path).await?;
        Ok(path)
    }
}
