//! Progress reporting for UI integration

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Progress phases
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Resolving output path conflicts
    Resolving,
    /// Downloading or locating the source
    Fetching,
    /// Extracting the requested time range
    Clipping,
    /// Re-encoding
    Transcoding,
    /// Rolling back or committing filesystem changes
    Cleanup,
    /// Operation completed
    Complete,
    /// Operation failed
    Failed,
    /// Operation cancelled
    Cancelled,
}

/// Single progress update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// Progress percentage (0.0 - 100.0) within the phase, if measurable
    pub percent: Option<f32>,
    pub detail: String,
}

impl ProgressEvent {
    pub fn phase(phase: ProgressPhase, detail: impl Into<String>) -> Self {
        Self {
            phase,
            percent: None,
            detail: detail.into(),
        }
    }

    pub fn percent(phase: ProgressPhase, percent: f32, detail: impl Into<String>) -> Self {
        Self {
            phase,
            percent: Some(percent.clamp(0.0, 100.0)),
            detail: detail.into(),
        }
    }
}

/// Callback handed to the collaborators; must be cheap and non-blocking
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Sink that drops every event
pub fn silent() -> ProgressSink {
    Arc::new(|_| {})
}

/// Sink that forwards events to tracing
pub fn logging() -> ProgressSink {
    Arc::new(|event: ProgressEvent| match event.percent {
        Some(p) => tracing::debug!(phase = ?event.phase, percent = p, "{}", event.detail),
        None => tracing::info!(phase = ?event.phase, "{}", event.detail),
    })
}

/// Forward events under a fixed phase (the clipper reuses the transcode engine)
pub fn in_phase(sink: ProgressSink, phase: ProgressPhase) -> ProgressSink {
    Arc::new(move |mut event: ProgressEvent| {
        event.phase = phase;
        sink(event)
    })
}

/// Parse a `[download]  42.3% of ...` line
pub fn parse_download_percent(line: &str) -> Option<f32> {
    let rest = line.trim_start().strip_prefix("[download]")?;
    let token = rest.split_whitespace().next()?;
    token.strip_suffix('%')?.parse::<f32>().ok()
}

/// Parse an `out_time_ms=12345678` progress line into seconds
pub fn parse_out_time(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // despite the name, out_time_ms is in microseconds
        "out_time_ms" | "out_time_us" => value.parse::<f64>().ok().map(|us| us / 1_000_000.0),
        _ => None,
    }
}
