//! Tool settings for si3sim.
//!
//! Settings are loaded from `$XDG_CONFIG_HOME/si3sim/config.toml`. They
//! control presentation only; the schedule itself lives in its own JSON
//! document.

use crate::sink::{OutputOptions, TimestampFormat};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Time column rendering
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    #[default]
    Calendar,
    EpochMillis,
}

/// Sample stream presentation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputSettings {
    #[serde(default = "default_series_name")]
    pub series_name: String,

    #[serde(default)]
    pub timestamps: TimestampStyle,

    #[serde(default = "default_calendar_delimiters")]
    pub calendar_delimiters: bool,

    #[serde(default)]
    pub calendar_decimals: u32,

    /// Fractional digits for values; depends on `timestamps` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_decimals: Option<u32>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            series_name: default_series_name(),
            timestamps: TimestampStyle::default(),
            calendar_delimiters: default_calendar_delimiters(),
            calendar_decimals: 0,
            value_decimals: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_series_name() -> String {
    "Si3 si3_estimate".into()
}

fn default_calendar_delimiters() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

impl Settings {
    /// Load settings from the standard path, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .ok_or_else(|| Error::Config("cannot locate a configuration directory".into()))?,
        };
        Ok(base.join("si3sim").join("config.toml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Resolve the sample stream presentation these settings describe
    pub fn output_options(&self) -> OutputOptions {
        let timestamps = match self.output.timestamps {
            TimestampStyle::Calendar => TimestampFormat::Calendar {
                delimiters: self.output.calendar_delimiters,
                decimals: self.output.calendar_decimals,
            },
            TimestampStyle::EpochMillis => TimestampFormat::EpochMillis,
        };
        OutputOptions {
            series_name: self.output.series_name.clone(),
            value_decimals: self
                .output
                .value_decimals
                .unwrap_or_else(|| timestamps.default_value_decimals()),
            timestamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.output_options(), OutputOptions::default());
    }

    #[test]
    fn test_partial_settings() {
        let toml_str = r#"
[output]
timestamps = "epoch_millis"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        let options = settings.output_options();
        assert_eq!(options.timestamps, TimestampFormat::EpochMillis);
        assert_eq!(options.value_decimals, 10);
        assert_eq!(options.series_name, "Si3 si3_estimate");
    }

    #[test]
    fn test_explicit_value_decimals_win() {
        let toml_str = r#"
[output]
calendar_delimiters = false
calendar_decimals = 3
value_decimals = 6
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        let options = settings.output_options();
        assert_eq!(
            options.timestamps,
            TimestampFormat::Calendar {
                delimiters: false,
                decimals: 3
            }
        );
        assert_eq!(options.value_decimals, 6);
    }

    #[test]
    fn test_unknown_timestamp_style_rejected() {
        let result: std::result::Result<Settings, _> = toml::from_str("[output]\ntimestamps = \"julian\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.output.series_name = "Rb clock".into();
        settings.logging.level = "debug".into();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output\nseries_name = 1").unwrap();
        assert!(Settings::load_from(&path).unwrap_err().is_parse());
    }
}
