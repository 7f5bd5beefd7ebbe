//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::errors::OperationError;
use crate::domain::model::*;

/// Arguments for the grab command
#[derive(Args, Debug)]
pub struct GrabArgs {
    /// Remote media URL
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub url: Option<String>,

    /// Local media file to process instead of a URL
    #[arg(short = 'i', long)]
    pub file: Option<PathBuf>,

    /// Output title (default: the source title)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Output directory (default: from configuration)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Keep only the audio
    #[arg(short = 'a', long)]
    pub audio_only: bool,

    /// Video (or combined) format id, as listed by `formats`
    #[arg(long)]
    pub video_format: Option<String>,

    /// Audio format id, as listed by `formats`
    #[arg(long)]
    pub audio_format: Option<String>,

    /// Fragment start (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = TimeSpec::parse)]
    pub start: Option<TimeSpec>,

    /// Fragment end (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = TimeSpec::parse)]
    pub end: Option<TimeSpec>,

    /// Re-encode video with this codec
    #[arg(long)]
    pub video_codec: Option<VideoCodec>,

    /// Video profile: high, medium, low, <n>mbps, prores-<proxy|lt|standard|hq>, dnxhr-<lq|sq|hq>
    #[arg(long)]
    pub video_profile: Option<VideoProfile>,

    /// Re-encode audio with this codec
    #[arg(long)]
    pub audio_codec: Option<AudioCodec>,

    /// Audio profile: <n>k or lossless
    #[arg(long)]
    pub audio_profile: Option<AudioProfile>,

    /// Container for the re-encoded output
    #[arg(long)]
    pub container: Option<Container>,

    /// Output resolution (2160p, 1440p, 1080p, 720p, 480p, 360p)
    #[arg(long)]
    pub resolution: Option<ResolutionPreset>,

    /// Allow scaling above the source resolution
    #[arg(long)]
    pub allow_upscale: bool,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Keep the fetched original next to the processed file
    #[arg(long)]
    pub keep_original: bool,
}

impl GrabArgs {
    /// Re-encode options implied by the flags
    pub fn recode_options(&self) -> RecodeOptions {
        let defaults = RecodeOptions::default();
        let video_enabled = self.video_codec.is_some()
            || self.video_profile.is_some()
            || self.resolution.is_some()
            || self.fps.is_some();
        let audio_enabled = self.audio_codec.is_some() || self.audio_profile.is_some();

        RecodeOptions {
            video_enabled,
            audio_enabled,
            container: self.container.unwrap_or(defaults.container),
            video_codec: self.video_codec.unwrap_or(defaults.video_codec),
            video_profile: self.video_profile.unwrap_or(defaults.video_profile),
            audio_codec: self.audio_codec.unwrap_or(defaults.audio_codec),
            audio_profile: self.audio_profile.unwrap_or(defaults.audio_profile),
            resolution: self.resolution,
            no_upscale: !self.allow_upscale,
            fps: self.fps,
            keep_original: self.keep_original,
        }
    }

    pub fn fragment(&self) -> Option<FragmentRange> {
        let range = FragmentRange::new(self.start, self.end);
        (!range.is_empty()).then_some(range)
    }
}

/// Arguments for the formats command
#[derive(Args, Debug)]
pub struct FormatsArgs {
    /// Remote media URL
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub url: Option<String>,

    /// Local media file
    #[arg(short = 'i', long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Target container (mp4, mkv, mov, webm, ...)
    pub container: Container,

    /// Video handling: copy, none, or a codec to encode with
    #[arg(long, default_value = "copy", value_parser = parse_video_choice)]
    pub video: VideoChoice,

    /// Audio handling: copy, none, or a codec to encode with
    #[arg(long, default_value = "copy", value_parser = parse_audio_choice)]
    pub audio: AudioChoice,

    /// Codec of the source video stream, as reported by the prober
    #[arg(long)]
    pub original_video: Option<String>,

    /// Codec of the source audio stream, as reported by the prober
    #[arg(long)]
    pub original_audio: Option<String>,
}

pub fn parse_video_choice(s: &str) -> Result<VideoChoice, OperationError> {
    match s.trim().to_lowercase().as_str() {
        "copy" => Ok(VideoChoice::Copy),
        "none" | "drop" => Ok(VideoChoice::Drop),
        other => other.parse().map(VideoChoice::Encode),
    }
}

pub fn parse_audio_choice(s: &str) -> Result<AudioChoice, OperationError> {
    match s.trim().to_lowercase().as_str() {
        "copy" => Ok(AudioChoice::Copy),
        "none" | "drop" => Ok(AudioChoice::Drop),
        other => other.parse().map(AudioChoice::Encode),
    }
}
