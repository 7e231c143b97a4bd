//! Configuration loading and config file resolution
//!
//! Configuration is bootstrap-only: it is read once when the hosting surface
//! builds a quiz session and never written back.
//!
//! # Config File Priority
//!
//! 1. Explicit path supplied by the host (highest priority)
//! 2. `BITQUIZ_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/bitquiz/config.toml`)
//!
//! A missing file is not an error: the loader logs a warning and falls back
//! to built-in defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BITQUIZ_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External transcoder settings (optional)
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    /// Playback monitoring settings (optional)
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Event bus settings (optional)
    #[serde(default)]
    pub events: EventsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Settings for the process-backed transcoder adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// FFmpeg executable (bare name resolved through PATH, or absolute path)
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Parent directory for the scratch file system (system temp dir if unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            scratch_dir: None,
        }
    }
}

/// Playback monitoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often the monitor task samples the sounding track's position
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ms: default_monitor_interval_ms(),
        }
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Number of events buffered before slow subscribers start lagging
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_monitor_interval_ms() -> u64 {
    250
}

fn default_event_capacity() -> usize {
    100
}

impl TomlConfig {
    /// Reject values that would make the session unusable
    pub fn validate(&self) -> Result<()> {
        if self.playback.monitor_interval_ms == 0 {
            return Err(Error::Config(
                "playback.monitor_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config(
                "events.capacity must be greater than zero".to_string(),
            ));
        }
        if self.transcoder.ffmpeg_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "transcoder.ffmpeg_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns `None` when no explicit path or environment override is given and
/// the platform has no config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: explicit path from the host
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    dirs::config_dir().map(|d| d.join("bitquiz").join("config.toml"))
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed for {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, degrading to defaults when no file exists
///
/// A file that exists but fails to parse is still an error; only absence is
/// treated as "use defaults".
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("No config directory available, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.playback.monitor_interval_ms, 250);
        assert_eq!(config.events.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [playback]
            monitor_interval_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.monitor_interval_ms, 50);
        assert_eq!(config.events.capacity, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = TomlConfig::default();
        config.playback.monitor_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = TomlConfig::default();
        config.events.capacity = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/bitquiz-explicit.toml");
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));
    }
}
