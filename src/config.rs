//! Persisted settings.
//!
//! Settings live in a TOML file under the per-user config directory
//! (`<config_dir>/wiggled/settings.toml`). A missing file yields defaults;
//! missing keys take their default values; unknown keys are an error so typos
//! surface instead of being ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

const APP_DIR: &str = "wiggled";
const SETTINGS_FILE: &str = "settings.toml";

/// Longest accepted interval: one day.
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Wiggle settings. Copied into the scheduler at startup and handed back
/// by every setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Seconds between wiggles, 1 to `MAX_INTERVAL_SECS`.
    pub interval_secs: u64,
    /// Pixels moved per step.
    pub pixel_distance: u32,
    pub pattern: Pattern,
    /// Whether wiggling runs at startup.
    pub enabled: bool,
    /// Whether the OS idle-suppression flag is held while running.
    pub suppress_idle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Well under the usual 1-5 minute lock timeouts.
            interval_secs: 30,
            pixel_distance: 1,
            pattern: Pattern::Linear,
            enabled: true,
            suppress_idle: true,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_interval(self.interval_secs)
    }

    /// Parses settings from TOML text. `path` is only used in error messages.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let settings = Self::from_toml(&text, path)?;
                log::info!("config: loaded {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config: {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes settings to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("config: saved {}", path.display());
        Ok(())
    }
}

/// Checks that `secs` is a usable wiggle interval.
pub fn validate_interval(secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid(
            "interval must be greater than zero".into(),
        ));
    }
    if secs > MAX_INTERVAL_SECS {
        return Err(ConfigError::Invalid(format!(
            "interval must be at most {MAX_INTERVAL_SECS}s, got {secs}s"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Per-user directory for this application's files.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// Default location of the settings file.
pub fn default_settings_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Settings, ConfigError> {
        Settings::from_toml(text, Path::new("test.toml"))
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.interval_secs, 30);
        assert_eq!(s.pixel_distance, 1);
        assert_eq!(s.pattern, Pattern::Linear);
        assert!(s.enabled);
        assert!(s.suppress_idle);
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s = parse("pattern = \"circular\"\npixel_distance = 4\n").unwrap();
        assert_eq!(s.pattern, Pattern::Circular);
        assert_eq!(s.pixel_distance, 4);
        assert_eq!(s.interval_secs, 30);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            parse("interval_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        assert!(matches!(
            parse("interval_secs = 9223372036854775807"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse(&format!("interval_secs = {}", MAX_INTERVAL_SECS + 1)),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(
            parse(&format!("interval_secs = {MAX_INTERVAL_SECS}"))
                .unwrap()
                .interval_secs,
            MAX_INTERVAL_SECS
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            parse("intervall_secs = 10"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        assert!(matches!(
            parse("pattern = \"zigzag\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            interval_secs: 120,
            pixel_distance: 3,
            pattern: Pattern::Circular,
            enabled: false,
            suppress_idle: false,
        };

        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
