// Domain rules - Container/codec compatibility policy

use tracing::debug;

use crate::domain::model::*;

/// Allowed codecs for one container
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityRule {
    pub container: Container,
    pub video: &'static [VideoCodec],
    pub audio: &'static [AudioCodec],
}

impl CompatibilityRule {
    /// Containers that cannot hold a video stream at all
    pub fn is_audio_only(&self) -> bool {
        self.video.is_empty()
    }
}

use crate::domain::model::AudioCodec as A;
use crate::domain::model::VideoCodec as V;

/// Static container -> allowed codec table
pub const COMPATIBILITY_RULES: &[CompatibilityRule] = &[
    CompatibilityRule {
        container: Container::Mp4,
        video: &[V::H264, V::H265, V::Av1],
        audio: &[A::Aac, A::Mp3, A::Ac3, A::Alac],
    },
    CompatibilityRule {
        container: Container::Mov,
        video: &[V::H264, V::H265, V::ProRes, V::DnxHd, V::Rawvideo],
        audio: &[A::Aac, A::Alac, A::Pcm, A::Mp3, A::Ac3],
    },
    CompatibilityRule {
        container: Container::Mkv,
        video: &[V::H264, V::H265, V::Vp9, V::Av1, V::ProRes, V::DnxHd, V::Rawvideo],
        audio: &[A::Aac, A::Mp3, A::Opus, A::Vorbis, A::Flac, A::Alac, A::Ac3, A::Pcm],
    },
    CompatibilityRule {
        container: Container::Webm,
        video: &[V::Vp9, V::Av1],
        audio: &[A::Opus, A::Vorbis],
    },
    CompatibilityRule {
        container: Container::Avi,
        video: &[V::H264, V::Rawvideo],
        audio: &[A::Mp3, A::Ac3, A::Pcm],
    },
    CompatibilityRule {
        container: Container::Mxf,
        video: &[V::DnxHd],
        audio: &[A::Pcm],
    },
    CompatibilityRule {
        container: Container::Gif,
        video: &[V::Gif],
        audio: &[],
    },
    CompatibilityRule {
        container: Container::Mp3,
        video: &[],
        audio: &[A::Mp3],
    },
    CompatibilityRule {
        container: Container::M4a,
        video: &[],
        audio: &[A::Aac, A::Alac],
    },
    CompatibilityRule {
        container: Container::Ogg,
        video: &[],
        audio: &[A::Vorbis, A::Opus, A::Flac],
    },
    CompatibilityRule {
        container: Container::Opus,
        video: &[],
        audio: &[A::Opus],
    },
    CompatibilityRule {
        container: Container::Flac,
        video: &[],
        audio: &[A::Flac],
    },
    CompatibilityRule {
        container: Container::Wav,
        video: &[],
        audio: &[A::Pcm],
    },
];

/// Rule for a container; every container has exactly one entry
pub fn rule_for(container: Container) -> CompatibilityRule {
    COMPATIBILITY_RULES
        .iter()
        .copied()
        .find(|r| r.container == container)
        .unwrap_or(CompatibilityRule {
            container,
            video: &[],
            audio: &[],
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompatibilityStatus {
    Valid,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityReport {
    pub status: CompatibilityStatus,
    pub message: String,
}

impl CompatibilityReport {
    /// Only `Valid` and `Warning` let the operation proceed
    pub fn permits(&self) -> bool {
        self.status != CompatibilityStatus::Error
    }

    fn valid() -> Self {
        Self {
            status: CompatibilityStatus::Valid,
            message: String::new(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: CompatibilityStatus::Error,
            message,
        }
    }
}

/// Pure container/codec compatibility check
pub struct CompatibilityValidator;

impl CompatibilityValidator {
    /// Evaluate the rules in order; the first error wins, warnings accumulate
    pub fn validate(
        container: Container,
        video: VideoChoice,
        audio: AudioChoice,
        original_video: Option<&str>,
        original_audio: Option<&str>,
    ) -> CompatibilityReport {
        let rule = rule_for(container);
        let mut warnings: Vec<String> = Vec::new();
        let original_video_codec = original_video.and_then(VideoCodec::from_name);
        let original_audio_codec = original_audio.and_then(AudioCodec::from_name);

        match video {
            VideoChoice::Encode(codec) => {
                if !rule.video.contains(&codec) {
                    return CompatibilityReport::error(format!(
                        "Video codec {} cannot be stored in .{}",
                        codec, container
                    ));
                }
            }
            VideoChoice::Copy => {
                if rule.is_audio_only() {
                    return CompatibilityReport::error(format!(
                        ".{} is an audio-only container; re-encode to audio or choose another container",
                        container
                    ));
                }
                if let Some(name) = original_video {
                    if !original_video_codec.map(|c| rule.video.contains(&c)).unwrap_or(false) {
                        warnings.push(format!(
                            "Copying {} video into .{} is non-standard and may not play everywhere",
                            name, container
                        ));
                    }
                }
            }
            VideoChoice::Drop => {}
        }

        let effective_video = match video {
            VideoChoice::Encode(codec) => Some(codec),
            VideoChoice::Copy => original_video_codec,
            VideoChoice::Drop => None,
        };
        let professional = effective_video
            .map(|c| c.family() == CodecFamily::Professional)
            .unwrap_or(false);
        if professional && audio == AudioChoice::Copy {
            // unknown originals are treated as compressed
            let uncompressed = original_audio_codec
                .map(AudioCodec::is_uncompressed)
                .unwrap_or(false);
            if !uncompressed {
                return CompatibilityReport::error(format!(
                    "{} video requires uncompressed audio; enable audio re-encoding instead of copying {}",
                    effective_video.map(VideoCodec::name).unwrap_or("professional"),
                    original_audio.unwrap_or("the original audio")
                ));
            }
        }

        match audio {
            AudioChoice::Encode(codec) => {
                if !rule.audio.contains(&codec) {
                    return CompatibilityReport::error(format!(
                        "Audio codec {} cannot be stored in .{}",
                        codec, container
                    ));
                }
            }
            AudioChoice::Copy => {
                if let Some(name) = original_audio {
                    if !original_audio_codec.map(|c| rule.audio.contains(&c)).unwrap_or(false) {
                        warnings.push(format!(
                            "Copying {} audio into .{} is non-standard and may not play everywhere",
                            name, container
                        ));
                    }
                }
            }
            AudioChoice::Drop => {}
        }

        if warnings.is_empty() {
            debug!(%container, ?video, ?audio, "Compatibility check passed");
            CompatibilityReport::valid()
        } else {
            debug!(%container, warnings = warnings.len(), "Compatibility check produced warnings");
            CompatibilityReport {
                status: CompatibilityStatus::Warning,
                message: warnings.join("; "),
            }
        }
    }
}

#[cfg(test)]
mod tests;
