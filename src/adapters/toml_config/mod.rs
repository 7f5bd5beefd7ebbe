// TOML config adapter - Reads and writes the configuration file

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{GrabXError, GrabXResult};

/// File name looked up in the working directory and its `config/` folder
pub const CONFIG_FILE_NAME: &str = "grabx.toml";

/// TOML configuration file adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse configuration text; `origin` is only used in error messages
    pub fn parse_str(content: &str, origin: &Path) -> GrabXResult<AppConfig> {
        toml::from_str(content).map_err(|e| GrabXError::ConfigParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a configuration file that must exist
    pub fn load(path: &Path) -> GrabXResult<AppConfig> {
        if !path.is_file() {
            return Err(GrabXError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse_str(&content, path)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Write a configuration file, creating its directory
    pub fn save(config: &AppConfig, path: &Path) -> GrabXResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config).map_err(|e| GrabXError::InvalidSetting {
            key: "config".to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Saved configuration file");
        Ok(())
    }

    /// Candidate locations in lookup order
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("config").join(CONFIG_FILE_NAME),
        ];
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")));
        if let Some(base) = base {
            paths.push(base.join("grabx").join("config.toml"));
        }
        paths
    }
}
