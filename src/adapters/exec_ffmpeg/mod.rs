//! FFmpeg execution adapter
//!
//! Executes a `TranscodePlan` as an ffmpeg subprocess, reporting progress from
//! `-progress pipe:1` and killing the process on cancellation.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::process::{ToolCommand, ToolError};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::cancel::CancellationToken;
use crate::engine::progress::{parse_out_time, ProgressEvent, ProgressPhase, ProgressSink};
use crate::ports::TranscodePort;

/// FFmpeg-based transcode engine
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Full argument list for a plan
    pub fn command_args(plan: &TranscodePlan) -> Vec<String> {
        let mut args: Vec<String> = ["-nostdin", "-loglevel", "error", "-progress", "pipe:1", "-nostats"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(plan.to_args());
        args
    }
}

#[async_trait]
impl TranscodePort for FfmpegTranscoder {
    async fn execute(
        &self,
        plan: &TranscodePlan,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<(), OperationError> {
        info!(
            input = %plan.input.display(),
            output = %plan.output.display(),
            stream_copy = plan.is_stream_copy(),
            "Running ffmpeg"
        );
        let duration = plan.duration_estimate.filter(|d| *d > 0.0);

        let result = ToolCommand::new(self.binary.clone())
            .args(Self::command_args(plan))
            .run_streaming(token, |line| {
                if let (Some(done), Some(total)) = (parse_out_time(line), duration) {
                    let percent = (done / total * 100.0) as f32;
                    progress(ProgressEvent::percent(ProgressPhase::Transcoding, percent, "Encoding"));
                }
            })
            .await;

        let output = match result {
            Ok(output) => output,
            Err(ToolError::Cancelled { .. }) => return Err(OperationError::UserCancelled),
            Err(e) => {
                return Err(OperationError::TranscodeFailed {
                    message: e.to_string(),
                })
            }
        };
        if !output.status.success() {
            return Err(OperationError::TranscodeFailed {
                message: output
                    .error_line()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("ffmpeg exited with {}", output.status)),
            });
        }

        debug!(output = %plan.output.display(), "ffmpeg finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_flags_precede_the_plan() {
        let plan = TranscodePlan::stream_copy("in.mkv".into(), "out.mp4.temp".into(), Container::Mp4);
        let args = FfmpegTranscoder::command_args(&plan);
        let progress = args.iter().position(|a| a == "-progress").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(progress < input);
        assert_eq!(args[args.len() - 3..], ["-f", "mp4", "out.mp4.temp"]);
    }

    #[tokio::test]
    async fn missing_binary_is_a_classified_failure() {
        let engine = FfmpegTranscoder::new("nonexistent_ffmpeg_xyz");
        let plan = TranscodePlan::stream_copy("a".into(), "b".into(), Container::Mkv);
        let err = engine
            .execute(&plan, crate::engine::progress::silent(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MissingTool);
    }
}
