//! Closed codec, container and profile types
//!
//! Free-form codec strings coming from the prober or the command line are parsed
//! into these types at the boundary; the core never matches on raw names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::OperationError;

/// Output container, identified by its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mkv,
    Mov,
    Webm,
    Avi,
    Mxf,
    Gif,
    Mp3,
    M4a,
    Ogg,
    Opus,
    Flac,
    Wav,
}

impl Container {
    pub const ALL: [Container; 13] = [
        Container::Mp4,
        Container::Mkv,
        Container::Mov,
        Container::Webm,
        Container::Avi,
        Container::Mxf,
        Container::Gif,
        Container::Mp3,
        Container::M4a,
        Container::Ogg,
        Container::Opus,
        Container::Flac,
        Container::Wav,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
            Container::Mov => "mov",
            Container::Webm => "webm",
            Container::Avi => "avi",
            Container::Mxf => "mxf",
            Container::Gif => "gif",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
            Container::Ogg => "ogg",
            Container::Opus => "opus",
            Container::Flac => "flac",
            Container::Wav => "wav",
        }
    }

    /// Muxer name passed to the transcode engine; needed because temp files
    /// carry a `.temp` suffix the engine cannot infer a format from
    pub fn muxer(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "matroska",
            Container::Mov => "mov",
            Container::Webm => "webm",
            Container::Avi => "avi",
            Container::Mxf => "mxf",
            Container::Gif => "gif",
            Container::Mp3 => "mp3",
            Container::M4a => "ipod",
            Container::Ogg => "ogg",
            Container::Opus => "opus",
            Container::Flac => "flac",
            Container::Wav => "wav",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        let container = match ext.as_str() {
            "mp4" | "m4v" => Container::Mp4,
            "mkv" | "mka" => Container::Mkv,
            "mov" => Container::Mov,
            "webm" => Container::Webm,
            "avi" => Container::Avi,
            "mxf" => Container::Mxf,
            "gif" => Container::Gif,
            "mp3" => Container::Mp3,
            "m4a" => Container::M4a,
            "ogg" | "oga" => Container::Ogg,
            "opus" => Container::Opus,
            "flac" => Container::Flac,
            "wav" => Container::Wav,
            _ => return None,
        };
        Some(container)
    }

    /// Natural audio-only container for a codec, used when extracting audio
    /// without re-encoding it
    pub fn for_audio_codec(codec: AudioCodec) -> Self {
        match codec {
            AudioCodec::Aac | AudioCodec::Alac => Container::M4a,
            AudioCodec::Mp3 => Container::Mp3,
            AudioCodec::Opus => Container::Opus,
            AudioCodec::Vorbis => Container::Ogg,
            AudioCodec::Flac => Container::Flac,
            AudioCodec::Pcm => Container::Wav,
            AudioCodec::Ac3 => Container::Mkv,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Container {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Container::from_extension(s)
            .ok_or_else(|| OperationError::InvalidRequest(format!("Unknown container: {}", s)))
    }
}

/// Broad grouping used by the compatibility rules and the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    /// Compressed distribution codecs (h264, vp9, ...)
    Delivery,
    /// Editing intermediates that must travel with uncompressed audio
    Professional,
    /// Palette-based animation
    Animation,
}

/// Video codecs the planner can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
    Av1,
    ProRes,
    DnxHd,
    Gif,
    Rawvideo,
}

impl VideoCodec {
    /// Parse a prober/fetcher codec name (`avc1.64001F`, `vp09.00.40.08`, `hevc`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        let head = lowered.split('.').next().unwrap_or_default();
        let codec = match head {
            "h264" | "avc" | "avc1" | "avc3" | "libx264" => VideoCodec::H264,
            "h265" | "hevc" | "hev1" | "hvc1" | "libx265" => VideoCodec::H265,
            "vp9" | "vp09" | "libvpx-vp9" => VideoCodec::Vp9,
            "av1" | "av01" | "libsvtav1" | "libaom-av1" => VideoCodec::Av1,
            "prores" | "prores_ks" | "apcn" | "apch" | "apcs" | "apco" => VideoCodec::ProRes,
            "dnxhd" | "dnxhr" => VideoCodec::DnxHd,
            "gif" => VideoCodec::Gif,
            "rawvideo" => VideoCodec::Rawvideo,
            _ => return None,
        };
        Some(codec)
    }

    pub fn family(self) -> CodecFamily {
        match self {
            VideoCodec::ProRes | VideoCodec::DnxHd | VideoCodec::Rawvideo => CodecFamily::Professional,
            VideoCodec::Gif => CodecFamily::Animation,
            _ => CodecFamily::Delivery,
        }
    }

    pub fn encoder(self) -> &'static str {
        match self {
            VideoCodec::H264 => "libx264",
            VideoCodec::H265 => "libx265",
            VideoCodec::Vp9 => "libvpx-vp9",
            VideoCodec::Av1 => "libsvtav1",
            VideoCodec::ProRes => "prores_ks",
            VideoCodec::DnxHd => "dnxhd",
            VideoCodec::Gif => "gif",
            VideoCodec::Rawvideo => "rawvideo",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Av1 => "av1",
            VideoCodec::ProRes => "prores",
            VideoCodec::DnxHd => "dnxhd",
            VideoCodec::Gif => "gif",
            VideoCodec::Rawvideo => "rawvideo",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoCodec {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoCodec::from_name(s)
            .ok_or_else(|| OperationError::InvalidRequest(format!("Unknown video codec: {}", s)))
    }
}

/// Audio codecs the planner can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
    Mp3,
    Opus,
    Vorbis,
    Flac,
    Alac,
    Ac3,
    Pcm,
}

impl AudioCodec {
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        if lowered.starts_with("pcm") {
            return Some(AudioCodec::Pcm);
        }
        let head = lowered.split('.').next().unwrap_or_default();
        let codec = match head {
            "aac" | "mp4a" => AudioCodec::Aac,
            "mp3" | "libmp3lame" => AudioCodec::Mp3,
            "opus" | "libopus" => AudioCodec::Opus,
            "vorbis" | "libvorbis" => AudioCodec::Vorbis,
            "flac" => AudioCodec::Flac,
            "alac" => AudioCodec::Alac,
            "ac3" | "ac-3" => AudioCodec::Ac3,
            "wav" => AudioCodec::Pcm,
            _ => return None,
        };
        Some(codec)
    }

    pub fn is_uncompressed(self) -> bool {
        matches!(self, AudioCodec::Pcm)
    }

    /// Lossless codecs take no bitrate parameter
    pub fn is_lossless(self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Alac | AudioCodec::Pcm)
    }

    pub fn encoder(self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "libmp3lame",
            AudioCodec::Opus => "libopus",
            AudioCodec::Vorbis => "libvorbis",
            AudioCodec::Flac => "flac",
            AudioCodec::Alac => "alac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Pcm => "pcm_s16le",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus => "opus",
            AudioCodec::Vorbis => "vorbis",
            AudioCodec::Flac => "flac",
            AudioCodec::Alac => "alac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Pcm => "pcm",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AudioCodec {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioCodec::from_name(s)
            .ok_or_else(|| OperationError::InvalidRequest(format!("Unknown audio codec: {}", s)))
    }
}

/// Quality tiers for CRF-style encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProResProfile {
    Proxy,
    Lt,
    Standard,
    Hq,
}

impl ProResProfile {
    /// prores_ks `-profile:v` value
    pub fn index(self) -> u8 {
        match self {
            ProResProfile::Proxy => 0,
            ProResProfile::Lt => 1,
            ProResProfile::Standard => 2,
            ProResProfile::Hq => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnxProfile {
    Lq,
    Sq,
    Hq,
}

impl DnxProfile {
    pub fn name(self) -> &'static str {
        match self {
            DnxProfile::Lq => "dnxhr_lq",
            DnxProfile::Sq => "dnxhr_sq",
            DnxProfile::Hq => "dnxhr_hq",
        }
    }
}

/// Video encoding profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoProfile {
    Quality(QualityLevel),
    /// Target bitrate in megabits per second
    CustomBitrate { mbps: f64 },
    ProRes(ProResProfile),
    Dnx(DnxProfile),
}

impl Default for VideoProfile {
    fn default() -> Self {
        VideoProfile::Quality(QualityLevel::Medium)
    }
}

impl FromStr for VideoProfile {
    type Err = OperationError;

    /// Accepts `high`, `medium`, `low`, `<n>mbps`, `prores-<proxy|lt|standard|hq>`, `dnxhr-<lq|sq|hq>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let profile = match lowered.as_str() {
            "high" => VideoProfile::Quality(QualityLevel::High),
            "medium" => VideoProfile::Quality(QualityLevel::Medium),
            "low" => VideoProfile::Quality(QualityLevel::Low),
            "prores-proxy" => VideoProfile::ProRes(ProResProfile::Proxy),
            "prores-lt" => VideoProfile::ProRes(ProResProfile::Lt),
            "prores-standard" => VideoProfile::ProRes(ProResProfile::Standard),
            "prores-hq" => VideoProfile::ProRes(ProResProfile::Hq),
            "dnxhr-lq" => VideoProfile::Dnx(DnxProfile::Lq),
            "dnxhr-sq" => VideoProfile::Dnx(DnxProfile::Sq),
            "dnxhr-hq" => VideoProfile::Dnx(DnxProfile::Hq),
            other => {
                let mbps = other
                    .strip_suffix("mbps")
                    .and_then(|n| n.trim().parse::<f64>().ok())
                    .filter(|n| *n > 0.0)
                    .ok_or_else(|| {
                        OperationError::InvalidRequest(format!("Unknown video profile: {}", s))
                    })?;
                VideoProfile::CustomBitrate { mbps }
            }
        };
        Ok(profile)
    }
}

/// Audio encoding profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioProfile {
    /// Target bitrate in kilobits per second
    Bitrate(u32),
    Lossless,
}

impl Default for AudioProfile {
    fn default() -> Self {
        AudioProfile::Bitrate(192)
    }
}

impl FromStr for AudioProfile {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered == "lossless" {
            return Ok(AudioProfile::Lossless);
        }
        lowered
            .trim_end_matches('k')
            .parse::<u32>()
            .ok()
            .filter(|k| *k > 0)
            .map(AudioProfile::Bitrate)
            .ok_or_else(|| OperationError::InvalidRequest(format!("Unknown audio profile: {}", s)))
    }
}

/// Named output resolution, expressed in landscape orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPreset {
    P2160,
    P1440,
    P1080,
    P720,
    P480,
    P360,
}

impl ResolutionPreset {
    /// (width, height) with the long edge first
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ResolutionPreset::P2160 => (3840, 2160),
            ResolutionPreset::P1440 => (2560, 1440),
            ResolutionPreset::P1080 => (1920, 1080),
            ResolutionPreset::P720 => (1280, 720),
            ResolutionPreset::P480 => (854, 480),
            ResolutionPreset::P360 => (640, 360),
        }
    }
}

impl FromStr for ResolutionPreset {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let preset = match lowered.trim_end_matches('p') {
            "2160" | "4k" => ResolutionPreset::P2160,
            "1440" => ResolutionPreset::P1440,
            "1080" => ResolutionPreset::P1080,
            "720" => ResolutionPreset::P720,
            "480" => ResolutionPreset::P480,
            "360" => ResolutionPreset::P360,
            _ => {
                return Err(OperationError::InvalidRequest(format!(
                    "Unknown resolution preset: {}",
                    s
                )))
            }
        };
        Ok(preset)
    }
}
