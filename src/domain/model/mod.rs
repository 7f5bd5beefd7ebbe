// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::{ErrorCategory, OperationError};

pub mod codec;
pub mod plan;

pub use codec::*;
pub use plan::*;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Convert to Duration
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds.max(0.0))
    }

    /// Parse time string: seconds (`90.5`), `MM:SS(.ms)` or `HH:MM:SS(.ms)`
    pub fn parse(time_str: &str) -> Result<Self, OperationError> {
        let trimmed = time_str.trim();
        let bad = |what: &str| OperationError::InvalidRequest(format!("{} in time '{}'", what, trimmed));

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(bad("Negative or non-finite value"));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds_part) = match parts.as_slice() {
            [m, s] => (0u32, *m, *s),
            [h, m, s] => (h.parse::<u32>().map_err(|_| bad("Invalid hours"))?, *m, *s),
            _ => return Err(bad("Unsupported format (use seconds, MM:SS or HH:MM:SS)")),
        };
        let minutes = minutes.parse::<u32>().map_err(|_| bad("Invalid minutes"))?;
        let seconds = seconds_part.parse::<f64>().map_err(|_| bad("Invalid seconds"))?;

        if parts.len() == 3 && minutes >= 60 {
            return Err(bad("Minutes must be less than 60"));
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(bad("Seconds must be between 0 and 60"));
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    }

    /// Filesystem-safe form (`00-01-30`), milliseconds only when present
    pub fn format_for_filename(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let base = format!(
            "{:02}-{:02}-{:02}",
            total_ms / 3_600_000,
            (total_ms % 3_600_000) / 60_000,
            (total_ms % 60_000) / 1000
        );
        match total_ms % 1000 {
            0 => base,
            ms => format!("{}.{:03}", base, ms),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Where the media comes from; exactly one kind per request
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Remote(String),
    Local(PathBuf),
}

impl Source {
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Remote(_))
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Source::Local(path) => Some(path),
            Source::Remote(_) => None,
        }
    }

    /// Build from the two mutually exclusive inputs a front end collects
    pub fn from_parts(url: Option<String>, path: Option<PathBuf>) -> Result<Self, OperationError> {
        match (url, path) {
            (Some(url), None) => Ok(Source::Remote(url)),
            (None, Some(path)) => Ok(Source::Local(path)),
            (Some(_), Some(_)) => Err(OperationError::InvalidRequest(
                "Specify either a URL or a local file, not both".to_string(),
            )),
            (None, None) => Err(OperationError::InvalidRequest(
                "No source given: specify a URL or a local file".to_string(),
            )),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote(url) => f.write_str(url),
            Source::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    VideoAudio,
    AudioOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// What a single format carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    VideoOnly,
    AudioOnly,
    /// Video and audio already muxed together
    Combined,
}

/// A fetchable format or a local stream, as reported by the prober
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    /// Opaque selector id
    pub id: String,
    pub kind: FormatKind,
    /// Primary codec (video codec for video/combined formats)
    pub codec: String,
    /// Audio codec carried by a combined format
    pub audio_codec: Option<String>,
    pub extension: String,
    pub resolution: Option<Resolution>,
    pub language: Option<String>,
    /// Total bitrate in kbit/s, when known
    pub bitrate_kbps: Option<f64>,
    /// Stream index, local files only
    pub stream_index: Option<usize>,
}

impl FormatDescriptor {
    pub fn is_combined(&self) -> bool {
        self.kind == FormatKind::Combined
    }

    pub fn has_video(&self) -> bool {
        self.kind != FormatKind::AudioOnly
    }

    pub fn has_audio(&self) -> bool {
        self.kind != FormatKind::VideoOnly
    }

    pub fn height(&self) -> Option<u32> {
        self.resolution.map(|r| r.height)
    }

    /// Codec of the audio this format contributes, if any
    pub fn audio_codec_name(&self) -> Option<&str> {
        match self.kind {
            FormatKind::AudioOnly => Some(self.codec.as_str()),
            FormatKind::Combined => self.audio_codec.as_deref(),
            FormatKind::VideoOnly => None,
        }
    }
}

/// Optional sub-range of the source to keep
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FragmentRange {
    pub start: Option<TimeSpec>,
    pub end: Option<TimeSpec>,
}

impl FragmentRange {
    pub fn new(start: Option<TimeSpec>, end: Option<TimeSpec>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Re-encode options chosen by the user
#[derive(Debug, Clone, PartialEq)]
pub struct RecodeOptions {
    pub video_enabled: bool,
    pub audio_enabled: bool,
    pub container: Container,
    pub video_codec: VideoCodec,
    pub video_profile: VideoProfile,
    pub audio_codec: AudioCodec,
    pub audio_profile: AudioProfile,
    pub resolution: Option<ResolutionPreset>,
    pub no_upscale: bool,
    pub fps: Option<u32>,
    /// Keep the un-clipped / un-encoded original next to the result
    pub keep_original: bool,
}

impl Default for RecodeOptions {
    fn default() -> Self {
        Self {
            video_enabled: false,
            audio_enabled: false,
            container: Container::Mp4,
            video_codec: VideoCodec::H264,
            video_profile: VideoProfile::default(),
            audio_codec: AudioCodec::Aac,
            audio_profile: AudioProfile::default(),
            resolution: None,
            no_upscale: true,
            fps: None,
            keep_original: false,
        }
    }
}

/// Everything one acquisition run needs; immutable once the run starts
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub source: Source,
    pub title: String,
    pub mode: Mode,
    pub video_format: Option<FormatDescriptor>,
    pub audio_format: Option<FormatDescriptor>,
    pub fragment: Option<FragmentRange>,
    pub recode: RecodeOptions,
    pub output_dir: PathBuf,
}

impl OperationRequest {
    pub fn new(source: Source, title: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            title: title.into(),
            mode: Mode::VideoAudio,
            video_format: None,
            audio_format: None,
            fragment: None,
            recode: RecodeOptions::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Boundary validation, run before any work starts
    pub fn validate(&self) -> Result<(), OperationError> {
        if let Source::Remote(url) = &self.source {
            if url.trim().is_empty() {
                return Err(OperationError::InvalidRequest("Empty URL".to_string()));
            }
        }

        if let Some(fragment) = &self.fragment {
            if let (Some(start), Some(end)) = (fragment.start, fragment.end) {
                if start.seconds >= end.seconds {
                    return Err(OperationError::InvalidFragment(format!(
                        "start ({}) must be before end ({})",
                        start, end
                    )));
                }
            }
        }

        match self.mode {
            Mode::AudioOnly => {
                if let Some(video) = &self.video_format {
                    if self.audio_format.is_none() && !video.is_combined() {
                        return Err(OperationError::InvalidRequest(
                            "Audio-only mode needs an audio format or a combined format".to_string(),
                        ));
                    }
                }
            }
            Mode::VideoAudio => {
                if self.audio_format.is_some() && self.video_format.is_none() {
                    return Err(OperationError::InvalidRequest(
                        "An audio format was selected without a video format".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn wants_fragment(&self) -> bool {
        self.fragment.map(|f| !f.is_empty()).unwrap_or(false)
    }

    /// Audio must be extracted from a combined stream because no independent
    /// audio format exists
    pub fn needs_audio_extraction(&self) -> bool {
        self.mode == Mode::AudioOnly
            && self.audio_format.is_none()
            && self
                .video_format
                .as_ref()
                .map(FormatDescriptor::is_combined)
                .unwrap_or(false)
    }

    pub fn video_choice(&self) -> VideoChoice {
        if self.mode == Mode::AudioOnly {
            VideoChoice::Drop
        } else if self.recode.video_enabled {
            VideoChoice::Encode(self.recode.video_codec)
        } else {
            VideoChoice::Copy
        }
    }

    pub fn audio_choice(&self) -> AudioChoice {
        let gif = self.recode.container == Container::Gif
            || (self.video_choice() == VideoChoice::Encode(VideoCodec::Gif));
        if gif {
            AudioChoice::Drop
        } else if self.recode.audio_enabled {
            AudioChoice::Encode(self.recode.audio_codec)
        } else {
            AudioChoice::Copy
        }
    }

    pub fn wants_transcode(&self) -> bool {
        self.needs_audio_extraction()
            || self.recode.audio_enabled
            || (self.mode == Mode::VideoAudio && self.recode.video_enabled)
    }

    /// Container the transcode stage writes
    pub fn target_container(&self) -> Container {
        if self.needs_audio_extraction() && !self.recode.audio_enabled {
            if let Some(codec) = self.original_audio_codec().and_then(AudioCodec::from_name) {
                return Container::for_audio_codec(codec);
            }
        }
        self.recode.container
    }

    pub fn original_video_codec(&self) -> Option<&str> {
        self.video_format
            .as_ref()
            .filter(|f| f.has_video())
            .map(|f| f.codec.as_str())
    }

    pub fn original_audio_codec(&self) -> Option<&str> {
        self.audio_format
            .as_ref()
            .and_then(FormatDescriptor::audio_codec_name)
            .or_else(|| {
                self.video_format
                    .as_ref()
                    .and_then(FormatDescriptor::audio_codec_name)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub index: usize,
    pub kind: StreamKind,
    pub codec: String,
    pub resolution: Option<Resolution>,
    pub language: Option<String>,
}

/// Probe result for a local file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    /// Duration in seconds, when the container reports one
    pub duration: Option<f64>,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn primary_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Video)
    }

    pub fn primary_audio(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Audio)
    }

    pub fn geometry(&self) -> Option<Resolution> {
        self.primary_video().and_then(|s| s.resolution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Path was free, or the existing file was moved aside to a backup
    Overwritten,
    Renamed,
    Cancelled,
}

/// Result of consulting the conflict resolver for one output path
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictDecision {
    pub final_path: PathBuf,
    /// Present only when an existing file was moved aside
    pub backup_path: Option<PathBuf>,
    pub outcome: ConflictOutcome,
}

impl ConflictDecision {
    pub fn free(path: PathBuf) -> Self {
        Self {
            final_path: path,
            backup_path: None,
            outcome: ConflictOutcome::Overwritten,
        }
    }
}

/// Blocking question the worker asks the main thread
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationRequest {
    /// Output path already exists: overwrite, rename or cancel
    FileConflict { path: PathBuf },
    /// Precise selection failed; accept the described alternative?
    AcceptCompromise { description: String },
    /// Re-encoding did not complete; keep the already-fetched file?
    KeepOriginal { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Overwrite,
    Rename,
    Yes,
    No,
    Cancel,
}

/// Final outcome reported to the front end
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub final_path: Option<PathBuf>,
    /// A partially-processed file (the fetched original) was kept on failure
    pub keep_partial: bool,
    /// Set for failures that deserve an error dialog
    pub category: Option<ErrorCategory>,
}

impl OperationResult {
    pub fn succeeded(path: PathBuf) -> Self {
        Self {
            success: true,
            message: format!("Saved to {}", path.display()),
            final_path: Some(path),
            keep_partial: false,
            category: None,
        }
    }

    pub fn quiet(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            final_path: None,
            keep_partial: false,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests;
