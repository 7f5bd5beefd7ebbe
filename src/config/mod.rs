//! Application configuration
//!
//! Every section deserializes with defaults, so a configuration file only
//! needs to name the settings it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::orchestrator::OrchestratorSettings;
use crate::output::ConflictPolicy;
use crate::planner::PlannerSettings;
use crate::utils::logging::LoggingConfig;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolsConfig,
    pub output: OutputConfig,
    pub transcode: TranscodeConfig,
    pub logging: LoggingConfig,
}

/// External tool locations; bare names are looked up on `PATH`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Output placement and conflict handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory used when a request names none
    pub directory: PathBuf,
    pub conflict_policy: ConflictPolicy,
    /// Answer compromise and keep-original questions with yes, without prompting
    pub assume_yes: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            conflict_policy: ConflictPolicy::Prompt,
            assume_yes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Encoder threads; 0 leaves the choice to the encoder
    pub threads: usize,
    pub gif_fps: u32,
    pub gif_width: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            gif_fps: 10,
            gif_width: 480,
        }
    }
}

impl AppConfig {
    /// Settings handed to the orchestrator at construction
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            conflict_policy: self.output.conflict_policy,
            planner: PlannerSettings {
                gif_fps: self.transcode.gif_fps,
                gif_width: self.transcode.gif_width,
                threads: Some(self.transcode.threads).filter(|t| *t > 0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [output]
            conflict_policy = "rename"

            [transcode]
            threads = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.output.conflict_policy, ConflictPolicy::Rename);
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.transcode.gif_fps, 10);

        let settings = config.orchestrator_settings();
        assert_eq!(settings.planner.threads, None);
        assert_eq!(settings.conflict_policy, ConflictPolicy::Rename);
    }
}
