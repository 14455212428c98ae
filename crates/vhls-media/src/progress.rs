//! Progress normalization and the caller-owned event sink.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use vhls_models::TranscodeProgress;

/// The receiving side of the progress channel went away.
#[derive(Debug, Error)]
#[error("progress sink closed")]
pub struct SinkClosed;

/// Ordered sink for progress/error events, owned by the caller
/// (typically the HTTP/WS layer). Events for one resolution arrive in
/// parse order with non-decreasing percent values.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn send(&self, event: TranscodeProgress) -> Result<(), SinkClosed>;
}

/// Sink backed by a tokio mpsc channel.
pub struct ChannelSink {
    tx: mpsc::Sender<TranscodeProgress>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<TranscodeProgress>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn send(&self, event: TranscodeProgress) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

/// Sink that collects events in memory; used by tests and fire-and-forget
/// callers that only need the terminal outcome.
#[derive(Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<TranscodeProgress>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TranscodeProgress> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn send(&self, event: TranscodeProgress) -> Result<(), SinkClosed> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Normalizes raw out-time observations into a clamped, non-decreasing
/// percent sequence for one resolution's run.
///
/// Probe-reported duration is advisory; encoder out-time can overshoot it
/// near the end of a run, so values are clamped to [0, 100] and never
/// allowed to move backwards.
#[derive(Debug, Default)]
pub struct PercentTracker {
    last: f64,
}

impl PercentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an out-time in seconds against the total duration and
    /// return the normalized percent.
    pub fn observe(&mut self, out_time_secs: f64, total_duration_secs: f64) -> f64 {
        let pct = if total_duration_secs > 0.0 {
            ((out_time_secs / total_duration_secs) * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.last = self.last.max(pct);
        self.last
    }
}

/// Parse an `out_time` timestamp (`HH:MM:SS[.fraction]`) into seconds.
pub fn parse_out_time(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_out_time() {
        assert_eq!(parse_out_time("00:00:00"), Some(0.0));
        assert_eq!(parse_out_time("00:01:00.00"), Some(60.0));
        assert_eq!(parse_out_time("01:00:00"), Some(3600.0));
        assert!((parse_out_time("00:00:30.500").unwrap() - 30.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_out_time_rejects_malformed() {
        assert_eq!(parse_out_time("00:00"), None);
        assert_eq!(parse_out_time("00:00:00:00"), None);
        assert_eq!(parse_out_time("garbage"), None);
    }

    #[test]
    fn test_percent_scenario_half_done() {
        // 60s of output against a 120s source is 50%
        let mut tracker = PercentTracker::new();
        let pct = tracker.observe(parse_out_time("00:01:00.00").unwrap(), 120.0);
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_non_decreasing() {
        let mut tracker = PercentTracker::new();
        let a = tracker.observe(30.0, 120.0);
        let b = tracker.observe(20.0, 120.0); // encoder restart artifact
        let c = tracker.observe(60.0, 120.0);
        assert!(a <= b && b <= c);
        assert!((b - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_clamped_on_overshoot() {
        let mut tracker = PercentTracker::new();
        assert_eq!(tracker.observe(130.0, 120.0), 100.0);
    }

    #[test]
    fn test_percent_zero_duration() {
        let mut tracker = PercentTracker::new();
        assert_eq!(tracker.observe(10.0, 0.0), 0.0);
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ChannelSink::new(tx);
        let event = TranscodeProgress::update(vhls_models::Resolution::new(640, 480), 0, 1, 10.0);
        assert!(sink.send(event).await.is_err());
    }
}
