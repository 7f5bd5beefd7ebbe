//! Builder for cancellable external tool invocations

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{ChildStdout, Command};
use tracing::{debug, warn};

use crate::engine::cancel::CancellationToken;

/// Stderr lines kept for error reporting
const STDERR_TAIL: usize = 40;

/// Failure to run a tool at all (a non-zero exit is not an error here)
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} executable not found ({program})")]
    NotFound { tool: String, program: PathBuf },

    #[error("failed to run {tool}: {message}")]
    Io { tool: String, message: String },

    #[error("{tool} was cancelled")]
    Cancelled { tool: String },
}

/// Output captured from a finished tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Full standard output
    pub stdout: String,
    /// Last lines of standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Most useful single error line: the last `ERROR:` line, else the last non-empty line
    pub fn error_line(&self) -> Option<&str> {
        let lines = || self.stderr.lines().map(str::trim).filter(|l| !l.is_empty());
        lines()
            .filter(|l| l.starts_with("ERROR:"))
            .last()
            .or_else(|| lines().last())
    }
}

/// A single external tool invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Run to completion, capturing output
    pub async fn output(&self) -> Result<ToolOutput, ToolError> {
        self.run_streaming(&CancellationToken::new(), |_| {}).await
    }

    /// Run, handing each stdout line to `on_line`
    ///
    /// When `token` is cancelled the child is killed and reaped before
    /// `ToolError::Cancelled` is returned.
    pub async fn run_streaming(
        &self,
        token: &CancellationToken,
        mut on_line: impl FnMut(&str) + Send,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.tool_name();
        debug!(%tool, args = ?self.args, "Spawning external tool");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotFound {
                    tool: tool.clone(),
                    program: self.program.clone(),
                },
                _ => ToolError::Io {
                    tool: tool.clone(),
                    message: format!("failed to spawn: {}", e),
                },
            })?;

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail).join("\n")
            })
        });

        let mut stdout_lines = child.stdout.take().map(|s| BufReader::new(s).lines());
        let mut stdout = String::new();
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    warn!(%tool, "Cancellation requested, killing process");
                    if let Err(e) = child.kill().await {
                        warn!(%tool, error = %e, "Failed to kill process");
                    }
                    return Err(ToolError::Cancelled { tool });
                }
                line = next_line(&mut stdout_lines) => match line {
                    Some(line) => {
                        on_line(&line);
                        stdout.push_str(&line);
                        stdout.push('\n');
                    }
                    None => break,
                },
            }
        }

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| ToolError::Io {
                tool: tool.clone(),
                message: format!("I/O error waiting for process: {}", e),
            })?,
            _ = token.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!(%tool, error = %e, "Failed to kill process");
                }
                return Err(ToolError::Cancelled { tool });
            }
        };

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        debug!(%tool, %status, "External tool finished");

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }
}

async fn next_line(lines: &mut Option<Lines<BufReader<ChildStdout>>>) -> Option<String> {
    match lines {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}
