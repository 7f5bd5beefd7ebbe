//! Declarative transcode parameter planning

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::OperationError;
use crate::domain::model::*;
use crate::domain::rules::{CompatibilityReport, CompatibilityStatus};

/// Planner knobs that come from configuration rather than the request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Frame rate for GIF output
    pub gif_fps: u32,
    /// Width for GIF output when no resolution preset is chosen
    pub gif_width: u32,
    /// Encoder thread count
    pub threads: Option<usize>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            gif_fps: 10,
            gif_width: 480,
            threads: None,
        }
    }
}

/// Builds a `TranscodePlan` from recode options; never executes anything
pub struct TranscodePlanner {
    settings: PlannerSettings,
}

impl TranscodePlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    /// Plan a transcode of `input` into `output`
    ///
    /// `source` supplies the duration estimate and the geometry used for
    /// portrait detection and the no-upscale clamp.
    pub fn plan(
        &self,
        request: &OperationRequest,
        compatibility: &CompatibilityReport,
        source: Option<&MediaInfo>,
        input: PathBuf,
        output: PathBuf,
    ) -> Result<TranscodePlan, OperationError> {
        if compatibility.status == CompatibilityStatus::Error {
            return Err(OperationError::Compatibility(compatibility.message.clone()));
        }

        let options = &request.recode;
        let geometry = source.and_then(MediaInfo::geometry);
        let container = request.target_container();

        let video = match request.video_choice() {
            VideoChoice::Drop => None,
            VideoChoice::Copy => Some(VideoSpec::Copy),
            VideoChoice::Encode(VideoCodec::Gif) => Some(VideoSpec::Encode {
                codec: VideoCodec::Gif,
                params: Vec::new(),
                filters: VideoFilters::Graph(self.gif_graph(options, geometry)),
            }),
            VideoChoice::Encode(VideoCodec::Rawvideo) => Some(VideoSpec::ForcedUncompressed {
                filters: scale_and_fps(options, geometry),
            }),
            VideoChoice::Encode(codec) => Some(VideoSpec::Encode {
                codec,
                params: video_params(codec, options.video_profile, container),
                filters: scale_and_fps(options, geometry),
            }),
        };

        let effective_video = match request.video_choice() {
            VideoChoice::Encode(codec) => Some(codec),
            VideoChoice::Copy => request.original_video_codec().and_then(VideoCodec::from_name),
            VideoChoice::Drop => None,
        };
        let professional = effective_video
            .map(|c| c.family() == CodecFamily::Professional)
            .unwrap_or(false);

        let audio = match request.audio_choice() {
            AudioChoice::Drop => None,
            _ if professional => {
                debug!("Professional video codec, forcing uncompressed audio");
                Some(AudioSpec::ForcedUncompressed)
            }
            AudioChoice::Copy => Some(AudioSpec::Copy),
            AudioChoice::Encode(codec) => Some(AudioSpec::Encode {
                codec,
                params: audio_params(codec, options.audio_profile),
            }),
        };

        if video.is_none() && audio.is_none() {
            return Err(OperationError::InvalidRequest(
                "Transcode would drop both video and audio".to_string(),
            ));
        }

        let plan = TranscodePlan {
            input,
            output,
            container,
            video,
            audio,
            pre_input: Vec::new(),
            post_input: Vec::new(),
            duration_estimate: source.and_then(|s| s.duration),
            threads: self.settings.threads,
        };
        info!(container = %plan.container, stream_copy = plan.is_stream_copy(), "Transcode planned");
        Ok(plan)
    }

    fn gif_graph(&self, options: &RecodeOptions, geometry: Option<Resolution>) -> String {
        let fps = options.fps.unwrap_or(self.settings.gif_fps);
        let width = match options.resolution {
            Some(preset) => resolve_resolution(preset, geometry, options.no_upscale).width,
            None => match geometry {
                Some(src) if options.no_upscale => self.settings.gif_width.min(src.width),
                _ => self.settings.gif_width,
            },
        };
        format!(
            "fps={},scale={}:-1,split[a][b];[a]palettegen[p];[b][p]paletteuse",
            fps, width
        )
    }
}

/// Map a landscape preset onto the source orientation, optionally never upscaling
pub fn resolve_resolution(preset: ResolutionPreset, source: Option<Resolution>, no_upscale: bool) -> Resolution {
    let (long, short) = preset.dimensions();
    let mut target = match source {
        Some(src) if src.is_portrait() => Resolution::new(short, long),
        _ => Resolution::new(long, short),
    };
    if no_upscale {
        if let Some(src) = source {
            if target.width > src.width || target.height > src.height {
                target = src;
            }
        }
    }
    target
}

fn scale_and_fps(options: &RecodeOptions, geometry: Option<Resolution>) -> VideoFilters {
    let mut filters = Vec::new();
    if let Some(preset) = options.resolution {
        let target = resolve_resolution(preset, geometry, options.no_upscale);
        filters.push(format!("scale={}:{}", target.width, target.height));
    }
    if let Some(fps) = options.fps {
        filters.push(format!("fps={}", fps));
    }
    VideoFilters::Chain(filters)
}

fn crf(codec: VideoCodec, level: QualityLevel) -> u8 {
    match (codec, level) {
        (VideoCodec::H264, QualityLevel::High) => 18,
        (VideoCodec::H264, QualityLevel::Medium) => 23,
        (VideoCodec::H264, QualityLevel::Low) => 28,
        (VideoCodec::H265, QualityLevel::High) => 20,
        (VideoCodec::H265, QualityLevel::Medium) => 26,
        (VideoCodec::H265, QualityLevel::Low) => 30,
        (VideoCodec::Vp9, QualityLevel::High) => 24,
        (VideoCodec::Vp9, QualityLevel::Medium) => 31,
        (VideoCodec::Vp9, QualityLevel::Low) => 36,
        (_, QualityLevel::High) => 24,
        (_, QualityLevel::Medium) => 32,
        (_, QualityLevel::Low) => 40,
    }
}

fn bitrate_params(mbps: f64) -> Vec<String> {
    let kbps = (mbps * 1000.0).round() as u64;
    vec![
        "-b:v".to_string(),
        format!("{}k", kbps),
        "-maxrate".to_string(),
        format!("{}k", kbps),
        "-bufsize".to_string(),
        format!("{}k", kbps * 2),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Encoder parameters; a profile that does not fit the codec falls back to its default
fn video_params(codec: VideoCodec, profile: VideoProfile, container: Container) -> Vec<String> {
    let level = match profile {
        VideoProfile::Quality(level) => Some(level),
        _ => None,
    };
    let custom = match profile {
        VideoProfile::CustomBitrate { mbps } => Some(mbps),
        _ => None,
    };

    match codec {
        VideoCodec::H264 | VideoCodec::H265 => {
            let mut params = strings(&["-preset", "medium"]);
            match custom {
                Some(mbps) => params.extend(bitrate_params(mbps)),
                None => {
                    let crf = crf(codec, level.unwrap_or(QualityLevel::Medium));
                    params.extend(["-crf".to_string(), crf.to_string()]);
                }
            }
            params.extend(strings(&["-pix_fmt", "yuv420p"]));
            if codec == VideoCodec::H265 && matches!(container, Container::Mp4 | Container::Mov) {
                params.extend(strings(&["-tag:v", "hvc1"]));
            }
            params
        }
        VideoCodec::Vp9 => match custom {
            Some(mbps) => bitrate_params(mbps),
            None => {
                let crf = crf(codec, level.unwrap_or(QualityLevel::Medium));
                vec![
                    "-crf".to_string(),
                    crf.to_string(),
                    "-b:v".to_string(),
                    "0".to_string(),
                    "-row-mt".to_string(),
                    "1".to_string(),
                ]
            }
        },
        VideoCodec::Av1 => match custom {
            Some(mbps) => bitrate_params(mbps),
            None => {
                let crf = crf(codec, level.unwrap_or(QualityLevel::Medium));
                vec![
                    "-crf".to_string(),
                    crf.to_string(),
                    "-preset".to_string(),
                    "8".to_string(),
                ]
            }
        },
        VideoCodec::ProRes => {
            let profile = match profile {
                VideoProfile::ProRes(p) => p,
                _ => ProResProfile::Standard,
            };
            vec![
                "-profile:v".to_string(),
                profile.index().to_string(),
                "-pix_fmt".to_string(),
                "yuv422p10le".to_string(),
            ]
        }
        VideoCodec::DnxHd => {
            let profile = match profile {
                VideoProfile::Dnx(p) => p,
                _ => DnxProfile::Sq,
            };
            vec![
                "-profile:v".to_string(),
                profile.name().to_string(),
                "-pix_fmt".to_string(),
                "yuv422p".to_string(),
            ]
        }
        VideoCodec::Gif | VideoCodec::Rawvideo => Vec::new(),
    }
}

fn audio_params(codec: AudioCodec, profile: AudioProfile) -> Vec<String> {
    match profile {
        AudioProfile::Bitrate(kbps) if !codec.is_lossless() => {
            vec!["-b:a".to_string(), format!("{}k", kbps)]
        }
        _ => Vec::new(),
    }
}
