//! Per-resolution rendition transcoding.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use vhls_models::{Resolution, TranscodeProgress};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::{PercentTracker, ProgressSink};

/// Transcode one rendition: scale the video to `resolution`, copy the
/// audio stream unchanged, and push a normalized progress event to `sink`
/// for every progress line the encoder emits.
///
/// Events carry `index`/`total` so the caller can attribute them within a
/// multi-resolution request. Terminal events (100% / failure) are the
/// caller's responsibility; this function only reports what the encoder
/// said while running. A partially written output file is left in place on
/// failure.
pub async fn transcode_rendition(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    resolution: Resolution,
    index: usize,
    total: usize,
    duration_secs: f64,
    runner: &FfmpegRunner,
    sink: Arc<dyn ProgressSink>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        "Transcoding rendition: {} -> {} ({})",
        input.display(),
        output.display(),
        resolution
    );

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(format!("scale={}:{}", resolution.width, resolution.height))
        .audio_codec("copy");

    // The runner's progress callback is synchronous; bridge it to the
    // async sink through an unbounded channel so a slow consumer never
    // stalls the stderr read loop.
    let (tx, mut rx) = mpsc::unbounded_channel::<f64>();
    let forwarder = tokio::spawn(async move {
        let mut tracker = PercentTracker::new();
        while let Some(secs) = rx.recv().await {
            let pct = tracker.observe(secs, duration_secs);
            let event = TranscodeProgress::update(resolution, index, total, pct);
            if sink.send(event).await.is_err() {
                break;
            }
        }
    });

    let result = runner
        .run_with_progress(&cmd, move |secs| {
            let _ = tx.send(secs);
        })
        .await;

    let _ = forwarder.await;

    result?;
    info!("Rendition complete: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemorySink;

    #[tokio::test]
    async fn test_scale_filter_shape() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4")
            .video_filter(format!("scale={}:{}", 1280, 720))
            .audio_codec("copy");
        let args = cmd.build_args();
        assert!(args.contains(&"scale=1280:720".to_string()));
        let ca = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[ca + 1], "copy");
    }

    #[tokio::test]
    async fn test_event_attribution() {
        // The forwarder stamps every event with the run's index/total.
        let sink = Arc::new(MemorySink::new());
        let resolution = Resolution::new(640, 480);

        let (tx, mut rx) = mpsc::unbounded_channel::<f64>();
        let sink2: Arc<dyn ProgressSink> = sink.clone();
        let forwarder = tokio::spawn(async move {
            let mut tracker = PercentTracker::new();
            while let Some(secs) = rx.recv().await {
                let pct = tracker.observe(secs, 100.0);
                let event = TranscodeProgress::update(resolution, 2, 5, pct);
                if sink2.send(event).await.is_err() {
                    break;
                }
            }
        });

        tx.send(25.0).unwrap();
        tx.send(75.0).unwrap();
        drop(tx);
        forwarder.await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.index == 2 && e.total == 5));
        assert_eq!(events[0].progress, 25.0);
        assert_eq!(events[1].progress, 75.0);
    }
}
