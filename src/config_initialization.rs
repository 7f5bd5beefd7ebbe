//! Configuration initialization and hierarchy management

use std::path::PathBuf;
use std::str::FromStr;

use crate::adapters::toml_config::TomlConfigAdapter;
use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::{GrabXError, GrabXResult};
use crate::output::ConflictPolicy;
use crate::utils::logging::{LogFormat, LogLevel};

/// Configuration after every layer was applied, with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfiguration {
    pub config: AppConfig,
    pub file: Option<PathBuf>,
}

/// Build the configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> GrabXResult<LoadedConfiguration> {
    // Step 1 and 2: defaults, overlaid by a file when one is found
    let (mut config, file) = match &cli.config {
        Some(path) => (TomlConfigAdapter::load(path)?, Some(path.clone())),
        None => match TomlConfigAdapter::default_locations()
            .into_iter()
            .find(|p| p.is_file())
        {
            Some(path) => (TomlConfigAdapter::load(&path)?, Some(path)),
            None => (AppConfig::default(), None),
        },
    };

    // Step 3: environment
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    // Step 4: command line
    apply_cli_overrides(&mut config, cli)?;

    Ok(LoadedConfiguration { config, file })
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> GrabXResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| GrabXError::InvalidSetting {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> GrabXResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(GrabXError::InvalidSetting {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// Apply `GRABX_*` variables; `lookup` abstracts the environment
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> GrabXResult<()> {
    if let Some(v) = lookup("GRABX_YTDLP") {
        config.tools.ytdlp = PathBuf::from(v);
    }
    if let Some(v) = lookup("GRABX_FFMPEG") {
        config.tools.ffmpeg = PathBuf::from(v);
    }
    if let Some(v) = lookup("GRABX_FFPROBE") {
        config.tools.ffprobe = PathBuf::from(v);
    }
    if let Some(v) = lookup("GRABX_OUTPUT_DIR") {
        config.output.directory = PathBuf::from(v);
    }
    if let Some(v) = lookup("GRABX_CONFLICT_POLICY") {
        config.output.conflict_policy = parse_setting::<ConflictPolicy>("GRABX_CONFLICT_POLICY", &v)?;
    }
    if let Some(v) = lookup("GRABX_ASSUME_YES") {
        config.output.assume_yes = parse_flag("GRABX_ASSUME_YES", &v)?;
    }
    if let Some(v) = lookup("GRABX_THREADS") {
        config.transcode.threads = parse_setting("GRABX_THREADS", &v)?;
    }
    if let Some(v) = lookup("GRABX_GIF_FPS") {
        config.transcode.gif_fps = parse_setting("GRABX_GIF_FPS", &v)?;
    }
    if let Some(v) = lookup("GRABX_GIF_WIDTH") {
        config.transcode.gif_width = parse_setting("GRABX_GIF_WIDTH", &v)?;
    }
    if let Some(v) = lookup("GRABX_LOG_LEVEL") {
        config.logging.level = parse_setting::<LogLevel>("GRABX_LOG_LEVEL", &v)?;
    }
    if let Some(v) = lookup("GRABX_LOG_FORMAT") {
        config.logging.format = parse_setting::<LogFormat>("GRABX_LOG_FORMAT", &v)?;
    }
    Ok(())
}

/// Apply command-line overrides
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> GrabXResult<()> {
    if let Some(level) = &cli.log_level {
        config.logging.level = parse_setting("--log-level", level)?;
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = parse_setting("--log-format", format)?;
    }
    if let Some(policy) = &cli.conflict {
        config.output.conflict_policy = parse_setting("--conflict", policy)?;
    }
    if cli.yes {
        config.output.assume_yes = true;
    }
    if let Commands::Grab(args) = &cli.command {
        if let Some(dir) = &args.output_dir {
            config.output.directory = dir.clone();
        }
    }
    Ok(())
}
