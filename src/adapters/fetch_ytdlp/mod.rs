//! yt-dlp fetch adapter
//!
//! Runs the fetcher as a subprocess, forwarding download progress and
//! reporting unsatisfiable selectors distinctly from other failures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::process::{ToolCommand, ToolError, ToolOutput};
use crate::domain::errors::*;
use crate::engine::cancel::CancellationToken;
use crate::engine::progress::{parse_download_percent, ProgressEvent, ProgressPhase, ProgressSink};
use crate::ports::FetchPort;
use crate::utils::path::PathUtils;

const FORMAT_UNAVAILABLE_MARKERS: &[&str] = &[
    "requested format is not available",
    "requested format not available",
    "no video formats found",
];

/// yt-dlp based fetcher
pub struct YtDlpFetcher {
    binary: PathBuf,
    ffmpeg: Option<PathBuf>,
}

impl YtDlpFetcher {
    /// Create new fetcher; `ffmpeg` is forwarded for merging when set
    pub fn new(binary: impl Into<PathBuf>, ffmpeg: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg,
        }
    }

    /// Build the argument list for one fetch attempt
    pub fn fetch_args(&self, url: &str, selector: &str, output_path: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "--newline",
            "--no-playlist",
            "--progress",
            "-f",
            selector,
            "-o",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(output_template(output_path));
        args.extend(["--print".to_string(), "after_move:filepath".to_string()]);

        // pin the container so the file lands at the claimed path
        if let Some(ext) = PathUtils::extension(output_path) {
            if selector.contains('+') {
                args.extend(["--merge-output-format".to_string(), ext.clone()]);
            }
            args.extend(["--remux-video".to_string(), ext]);
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            args.extend([
                "--ffmpeg-location".to_string(),
                ffmpeg.to_string_lossy().into_owned(),
            ]);
        }
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Ask the fetcher for the media title without downloading
    pub async fn resolve_title(&self, url: &str) -> Result<String, OperationError> {
        let output = ToolCommand::new(self.binary.clone())
            .args(["--no-playlist", "--skip-download", "--print", "title", "--", url])
            .output()
            .await
            .map_err(|e| OperationError::FetchFailed {
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(OperationError::FetchFailed {
                message: failure_message(&output),
            });
        }
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| OperationError::FetchFailed {
                message: "the source reported no title".to_string(),
            })
    }
}

/// `<dir>/<stem>.%(ext)s`, with `%` in the stem escaped
fn output_template(output_path: &Path) -> String {
    let stem = PathUtils::stem(output_path).replace('%', "%%");
    output_path
        .with_file_name(format!("{}.%(ext)s", stem))
        .to_string_lossy()
        .into_owned()
}

fn failure_message(output: &ToolOutput) -> String {
    output
        .error_line()
        .map(str::to_string)
        .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status))
}

/// Map a failed run to a fetch error, singling out unsatisfiable selectors
pub fn classify_failure(selector: &str, output: &ToolOutput) -> FetchError {
    let stderr = output.stderr.to_lowercase();
    if FORMAT_UNAVAILABLE_MARKERS.iter().any(|m| stderr.contains(m)) {
        FetchError::SelectorUnavailable {
            selector: selector.to_string(),
        }
    } else {
        FetchError::Failed {
            message: failure_message(output),
        }
    }
}

#[async_trait]
impl FetchPort for YtDlpFetcher {
    async fn fetch(
        &self,
        source: &str,
        selector: &str,
        output_path: &Path,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, FetchError> {
        let args = self.fetch_args(source, selector, output_path);
        let mut written: Option<PathBuf> = None;

        let result = ToolCommand::new(self.binary.clone())
            .args(args)
            .run_streaming(token, |line| {
                if let Some(percent) = parse_download_percent(line) {
                    progress(ProgressEvent::percent(ProgressPhase::Fetching, percent, line.trim()));
                } else {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('[') {
                        written = Some(PathBuf::from(trimmed));
                    }
                }
            })
            .await;

        let output = match result {
            Ok(output) => output,
            Err(ToolError::Cancelled { .. }) => return Err(FetchError::Cancelled),
            Err(e) => {
                return Err(FetchError::Failed {
                    message: e.to_string(),
                })
            }
        };
        if !output.status.success() {
            return Err(classify_failure(selector, &output));
        }

        let path = written.unwrap_or_else(|| output_path.to_path_buf());
        info!(path = %path.display(), "yt-dlp finished");
        debug!(selector, "Fetch succeeded");
        Ok(path)
    }
}
