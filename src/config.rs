// Conductor configuration - Loaded from RON or JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for building a [`crate::Conductor`] and driving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Beats per minute
    pub bpm: u32,
    /// Steps per beat
    pub measure: u32,
    /// Seed for the frequency snapshot shuffle (entropy when absent)
    pub shuffle_seed: Option<u64>,
    /// Capacity of each event queue opened on the conductor
    pub event_queue_capacity: usize,
    /// Ticks per second for a driver loop
    pub frame_rate: f64,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            bpm: 100,
            measure: 4,
            shuffle_seed: None,
            event_queue_capacity: 256,
            frame_rate: 60.0,
        }
    }
}

impl ConductorConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.ron` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = match Format::of(path)? {
            Format::Ron => Self::from_ron_str(&text)?,
            Format::Json => Self::from_json_str(&text)?,
        };
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to a `.ron` or `.json` file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match Format::of(path)? {
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Per-user config location (`<config dir>/beat_conductor/conductor.ron`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("beat_conductor").join("conductor.ron"))
    }

    /// Load from [`ConductorConfig::default_path`], falling back to defaults
    /// when the file does not exist
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Seconds between two driver ticks
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

enum Format {
    Ron,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Ok(Format::Ron),
            Some("json") => Ok(Format::Json),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ConductorConfig::default();
        assert_eq!(config.bpm, 100);
        assert_eq!(config.measure, 4);
        assert_eq!(config.shuffle_seed, None);
        assert_eq!(config.event_queue_capacity, 256);
        assert!((config.frame_interval() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_ron() {
        let config = ConductorConfig::from_ron_str("(bpm: 128, shuffle_seed: Some(9))").unwrap();
        assert_eq!(config.bpm, 128);
        assert_eq!(config.measure, 4);
        assert_eq!(config.shuffle_seed, Some(9));
    }

    #[test]
    fn test_partial_json() {
        let config = ConductorConfig::from_json_str(r#"{"measure": 3}"#).unwrap();
        assert_eq!(config.bpm, 100);
        assert_eq!(config.measure, 3);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ConductorConfig::from_json_str(r#"{"frame_rate": 0.0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConductorConfig::from_json_str(r#"{"event_queue_capacity": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConductorConfig::from_ron_str("(bpm: \"fast\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_save_load_both_formats() {
        let dir = tempdir().unwrap();
        let config = ConductorConfig {
            bpm: 90,
            measure: 2,
            shuffle_seed: Some(3),
            event_queue_capacity: 16,
            frame_rate: 30.0,
        };

        for name in ["conductor.ron", "conductor.json"] {
            let path = dir.path().join("cfg").join(name);
            config.save(&path).unwrap();
            assert_eq!(ConductorConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conductor.toml");
        assert!(matches!(
            ConductorConfig::default().save(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        std::fs::write(&path, "bpm = 1").unwrap();
        assert!(matches!(
            ConductorConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }
}
