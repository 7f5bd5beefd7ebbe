// Adapters - External system implementations

pub mod confirm_terminal;
pub mod exec_ffmpeg;
pub mod fetch_ytdlp;
pub mod probe_ffprobe;
pub mod process;
pub mod toml_config;

// Re-export adapters
pub use confirm_terminal::TerminalPrompter;
pub use exec_ffmpeg::FfmpegTranscoder;
pub use fetch_ytdlp::YtDlpFetcher;
pub use probe_ffprobe::ToolProber;
pub use toml_config::TomlConfigAdapter;
