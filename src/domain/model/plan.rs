//! Declarative transcode plans handed to the external engine

use std::path::PathBuf;

use crate::domain::model::codec::{AudioCodec, Container, VideoCodec};

/// What the caller wants done with the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoChoice {
    Copy,
    Encode(VideoCodec),
    /// No video stream in the output (audio extraction)
    Drop,
}

/// What the caller wants done with the audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioChoice {
    Copy,
    Encode(AudioCodec),
    /// No audio stream in the output (GIF)
    Drop,
}

/// Video filters; a GIF palette graph excludes independent scale/fps filters
#[derive(Debug, Clone, PartialEq)]
pub enum VideoFilters {
    Chain(Vec<String>),
    Graph(String),
}

impl VideoFilters {
    pub fn none() -> Self {
        VideoFilters::Chain(Vec::new())
    }

    /// Value for the engine's video filter argument, if any
    pub fn render(&self) -> Option<String> {
        match self {
            VideoFilters::Chain(filters) if filters.is_empty() => None,
            VideoFilters::Chain(filters) => Some(filters.join(",")),
            VideoFilters::Graph(graph) => Some(graph.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoSpec {
    Copy,
    Encode {
        codec: VideoCodec,
        params: Vec<String>,
        filters: VideoFilters,
    },
    ForcedUncompressed {
        filters: VideoFilters,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioSpec {
    Copy,
    Encode { codec: AudioCodec, params: Vec<String> },
    ForcedUncompressed,
}

/// Complete parameter set for one transcode engine invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodePlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub container: Container,
    /// `None` drops the stream from the output
    pub video: Option<VideoSpec>,
    pub audio: Option<AudioSpec>,
    /// Parameters placed before the input (seek)
    pub pre_input: Vec<String>,
    /// Parameters placed after the input (duration)
    pub post_input: Vec<String>,
    /// Expected output duration in seconds, for progress reporting
    pub duration_estimate: Option<f64>,
    pub threads: Option<usize>,
}

impl TranscodePlan {
    /// Lossless copy of every selected stream
    pub fn stream_copy(input: PathBuf, output: PathBuf, container: Container) -> Self {
        Self {
            input,
            output,
            container,
            video: Some(VideoSpec::Copy),
            audio: Some(AudioSpec::Copy),
            pre_input: Vec::new(),
            post_input: Vec::new(),
            duration_estimate: None,
            threads: None,
        }
    }

    pub fn is_stream_copy(&self) -> bool {
        matches!(self.video, Some(VideoSpec::Copy) | None)
            && matches!(self.audio, Some(AudioSpec::Copy) | None)
    }

    /// Render the plan as an ffmpeg-compatible argument list
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];
        args.extend(self.pre_input.iter().cloned());
        args.push("-i".into());
        args.push(self.input.to_string_lossy().into_owned());

        match &self.video {
            None => args.push("-vn".into()),
            Some(VideoSpec::Copy) => args.extend(["-c:v".into(), "copy".into()]),
            Some(VideoSpec::Encode {
                codec,
                params,
                filters,
            }) => {
                args.extend(["-c:v".into(), codec.encoder().into()]);
                args.extend(params.iter().cloned());
                if let Some(vf) = filters.render() {
                    args.extend(["-vf".into(), vf]);
                }
            }
            Some(VideoSpec::ForcedUncompressed { filters }) => {
                args.extend([
                    "-c:v".into(),
                    VideoCodec::Rawvideo.encoder().into(),
                    "-pix_fmt".into(),
                    "yuv422p".into(),
                ]);
                if let Some(vf) = filters.render() {
                    args.extend(["-vf".into(), vf]);
                }
            }
        }

        match &self.audio {
            None => args.push("-an".into()),
            Some(AudioSpec::Copy) => args.extend(["-c:a".into(), "copy".into()]),
            Some(AudioSpec::Encode { codec, params }) => {
                args.extend(["-c:a".into(), codec.encoder().into()]);
                args.extend(params.iter().cloned());
            }
            Some(AudioSpec::ForcedUncompressed) => {
                args.extend(["-c:a".into(), AudioCodec::Pcm.encoder().into()]);
            }
        }

        if let Some(threads) = self.threads {
            args.extend(["-threads".into(), threads.to_string()]);
        }
        args.extend(self.post_input.iter().cloned());
        args.extend(["-f".into(), self.container.muxer().into()]);
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}
