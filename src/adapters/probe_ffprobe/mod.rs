//! Probe adapter: ffprobe for local files, `yt-dlp -J` for remote format lists

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::adapters::process::{ToolCommand, ToolOutput};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::ProbePort;

/// Probe adapter backed by ffprobe and yt-dlp
pub struct ToolProber {
    ffprobe: PathBuf,
    ytdlp: PathBuf,
}

impl ToolProber {
    pub fn new(ffprobe: impl Into<PathBuf>, ytdlp: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ytdlp: ytdlp.into(),
        }
    }

    async fn run(&self, command: &mut ToolCommand) -> Result<ToolOutput, OperationError> {
        let output = command.output().await.map_err(|e| OperationError::ProbeFailed {
            message: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(OperationError::ProbeFailed {
                message: output
                    .error_line()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("exited with {}", output.status)),
            });
        }
        Ok(output)
    }

    async fn remote_formats(&self, url: &str) -> Result<Vec<FormatDescriptor>, OperationError> {
        let output = self
            .run(ToolCommand::new(self.ytdlp.clone()).args(["-J", "--no-playlist", "--", url]))
            .await?;
        let formats = parse_remote_formats(&output.stdout)?;
        info!(count = formats.len(), "Listed remote formats");
        Ok(formats)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteInfo {
    #[serde(default)]
    formats: Vec<RemoteFormat>,
}

#[derive(Debug, Deserialize)]
struct RemoteFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    language: Option<String>,
    tbr: Option<f64>,
}

fn parse_error(e: serde_json::Error) -> OperationError {
    OperationError::ProbeFailed {
        message: format!("unreadable probe output: {}", e),
    }
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output
pub fn parse_media_info(json: &str) -> Result<MediaInfo, OperationError> {
    let parsed: FfprobeOutput = serde_json::from_str(json).map_err(parse_error)?;
    let streams = parsed
        .streams
        .into_iter()
        .map(|s| {
            let kind = match s.codec_type.as_deref() {
                Some("video") => StreamKind::Video,
                Some("audio") => StreamKind::Audio,
                Some("subtitle") => StreamKind::Subtitle,
                _ => StreamKind::Other,
            };
            StreamInfo {
                index: s.index,
                kind,
                codec: s.codec_name.unwrap_or_else(|| "unknown".to_string()),
                resolution: match (s.width, s.height) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => Some(Resolution::new(w, h)),
                    _ => None,
                },
                language: s.tags.get("language").cloned(),
            }
        })
        .collect();
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);
    Ok(MediaInfo { duration, streams })
}

/// Parse `yt-dlp -J` output into format descriptors, skipping formats with neither stream
pub fn parse_remote_formats(json: &str) -> Result<Vec<FormatDescriptor>, OperationError> {
    let info: RemoteInfo = serde_json::from_str(json).map_err(parse_error)?;
    let present = |codec: &Option<String>| codec.as_deref() != Some("none");

    Ok(info
        .formats
        .into_iter()
        .filter_map(|f| {
            let (has_video, has_audio) = (present(&f.vcodec), present(&f.acodec));
            let kind = match (has_video, has_audio) {
                (true, true) => FormatKind::Combined,
                (true, false) => FormatKind::VideoOnly,
                (false, true) => FormatKind::AudioOnly,
                (false, false) => return None,
            };
            let unknown = || "unknown".to_string();
            let codec = match kind {
                FormatKind::AudioOnly => f.acodec.clone().unwrap_or_else(unknown),
                _ => f.vcodec.clone().unwrap_or_else(unknown),
            };
            Some(FormatDescriptor {
                id: f.format_id,
                kind,
                codec,
                audio_codec: if kind == FormatKind::Combined { f.acodec } else { None },
                extension: f.ext.unwrap_or_else(|| "mp4".to_string()),
                resolution: match (f.width, f.height) {
                    (Some(w), Some(h)) => Some(Resolution::new(w, h)),
                    _ => None,
                },
                language: f.language,
                bitrate_kbps: f.tbr,
                stream_index: None,
            })
        })
        .collect())
}

/// One descriptor per local stream; video streams count as combined when the file has audio
pub fn local_formats(path: &Path, info: &MediaInfo) -> Vec<FormatDescriptor> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let audio_codec = info.primary_audio().map(|s| s.codec.clone());

    info.streams
        .iter()
        .filter_map(|s| {
            let kind = match s.kind {
                StreamKind::Video if audio_codec.is_some() => FormatKind::Combined,
                StreamKind::Video => FormatKind::VideoOnly,
                StreamKind::Audio => FormatKind::AudioOnly,
                _ => return None,
            };
            Some(FormatDescriptor {
                id: s.index.to_string(),
                kind,
                codec: s.codec.clone(),
                audio_codec: if kind == FormatKind::Combined { audio_codec.clone() } else { None },
                extension: extension.clone(),
                resolution: s.resolution,
                language: s.language.clone(),
                bitrate_kbps: None,
                stream_index: Some(s.index),
            })
        })
        .collect()
}

#[async_trait]
impl ProbePort for ToolProber {
    async fn list_formats(&self, source: &Source) -> Result<Vec<FormatDescriptor>, OperationError> {
        match source {
            Source::Remote(url) => self.remote_formats(url).await,
            Source::Local(path) => {
                let info = self.media_info(path).await?;
                Ok(local_formats(path, &info))
            }
        }
    }

    async fn media_info(&self, path: &Path) -> Result<MediaInfo, OperationError> {
        let output = self
            .run(ToolCommand::new(self.ffprobe.clone()).args([
                "-v".to_string(),
                "error".to_string(),
                "-print_format".to_string(),
                "json".to_string(),
                "-show_format".to_string(),
                "-show_streams".to_string(),
                path.to_string_lossy().into_owned(),
            ]))
            .await?;
        let info = parse_media_info(&output.stdout)?;
        debug!(path = %path.display(), duration = ?info.duration, streams = info.streams.len(), "Probed media");
        Ok(info)
    }
}
