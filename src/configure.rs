use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

use crate::error::LogError;
use crate::level::LogLevel;

const CONFIG_FILE: &str = "config/annolog";
const ENV_PREFIX: &str = "ANNOLOG";

#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    /// Directory holding `<destination>.log` files.
    pub log_dir: PathBuf,
    /// Mirror every line to stdout.
    pub console: bool,
    /// Threshold below which sink writes are dropped.
    pub level: String,
    /// chrono format string for the line timestamp.
    pub time_format: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            console: true,
            level: "debug".to_string(),
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl SinkSettings {
    /// Default settings writing under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// `off` and `trace` on top of the sink levels; `critical` shares Error's slot.
    pub fn level_filter(&self) -> Result<LevelFilter, LogError> {
        match self.level.to_lowercase().as_str() {
            "off" => Ok(LevelFilter::Off),
            "trace" => Ok(LevelFilter::Trace),
            other => Ok(other.parse::<LogLevel>()?.to_log_level().to_level_filter()),
        }
    }
}

pub fn load_settings() -> Result<SinkSettings, ConfigError> {
    let defaults = SinkSettings::default();
    let s = Config::builder()
        // Set defaults
        .set_default("log_dir", defaults.log_dir.to_string_lossy().to_string())?
        .set_default("console", defaults.console)?
        .set_default("level", defaults.level)?
        .set_default("time_format", defaults.time_format)?
        // Add configuration from a file, if present
        .add_source(File::with_name(CONFIG_FILE).required(false))
        // Add configuration from environment variables
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;

    s.try_deserialize()
}

static SHARED: OnceLock<Arc<SinkSettings>> = OnceLock::new();

/// Process-wide settings, loaded on first use.
pub fn shared_settings() -> Result<Arc<SinkSettings>, LogError> {
    if let Some(settings) = SHARED.get() {
        return Ok(settings.clone());
    }
    let loaded = Arc::new(load_settings()?);
    Ok(SHARED.get_or_init(|| loaded).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_parsing() {
        let mut settings = SinkSettings::default();
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Debug));

        settings.level = "WARN".to_string();
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Warn));

        settings.level = "off".to_string();
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Off));
    }

    #[test]
    fn test_critical_threshold_keeps_error_and_critical() {
        let settings = SinkSettings { level: "critical".to_string(), ..SinkSettings::default() };
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Error));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let settings = SinkSettings { level: "verbose".to_string(), ..SinkSettings::default() };
        assert_eq!(settings.level_filter(), Err(LogError::InvalidLevel("verbose".to_string())));
    }

    #[test]
    fn test_in_dir_keeps_defaults() {
        let settings = SinkSettings::in_dir("/tmp/annolog");
        assert_eq!(settings.log_dir, PathBuf::from("/tmp/annolog"));
        assert!(settings.console);
        assert_eq!(settings.time_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_load_settings_defaults() {
        let settings = load_settings().unwrap();
        assert!(!settings.time_format.is_empty());
    }
}
