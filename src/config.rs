// Engine configuration - timing windows, buffer sizes and output volume
// Stored as RON next to the other application files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Engine configuration
///
/// The lookahead thread wakes every `lookahead_interval_ms` and schedules the
/// notes falling in the next `schedule_ahead_secs`. The window must stay
/// larger than the wake-up interval so a step always lands inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lookahead_interval_ms: u64,
    pub schedule_ahead_secs: f64,
    /// Delay between start() and the first note
    pub start_offset_secs: f64,
    pub resume_timeout_ms: u64,
    /// Capacity of each subscriber channel
    pub event_capacity: usize,
    /// Capacity of the scheduler -> audio callback channel
    pub click_queue_capacity: usize,
    pub volume: f32,
    pub log_level: String,
}

impl EngineConfig {
    pub const FILE_NAME: &'static str = "engine.ron";

    /// Default location: <config dir>/mymusic_metronome/engine.ron
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(crate::APP_DIR_NAME).join(Self::FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }

    /// Load from the default location; missing file means defaults
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write as pretty RON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Wake-up period of the lookahead thread (at least 1ms)
    pub fn lookahead_interval(&self) -> Duration {
        Duration::from_millis(self.lookahead_interval_ms.max(1))
    }

    /// Schedule-ahead window, kept strictly larger than the wake-up period
    pub fn schedule_ahead_secs(&self) -> f64 {
        let floor = self.lookahead_interval().as_secs_f64() * 2.0;
        if self.schedule_ahead_secs.is_finite() && self.schedule_ahead_secs > floor {
            self.schedule_ahead_secs
        } else {
            floor.max(Self::default().schedule_ahead_secs)
        }
    }

    /// Positive delay before the first note
    pub fn start_offset_secs(&self) -> f64 {
        if self.start_offset_secs.is_finite() && self.start_offset_secs > 0.0 {
            self.start_offset_secs
        } else {
            Self::default().start_offset_secs
        }
    }

    pub fn resume_timeout(&self) -> Duration {
        Duration::from_millis(self.resume_timeout_ms)
    }

    pub fn volume(&self) -> f32 {
        if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            Self::default().volume
        }
    }

    /// Parsed log level (unknown names fall back to Info)
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_interval_ms: 25,
            schedule_ahead_secs: 0.1,
            start_offset_secs: 0.05,
            resume_timeout_ms: 2000,
            event_capacity: 256,
            click_queue_capacity: 256,
            volume: 0.5,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.lookahead_interval(), Duration::from_millis(25));
        assert_eq!(config.schedule_ahead_secs(), 0.1);
        assert_eq!(config.start_offset_secs(), 0.05);
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_sanitized_windows() {
        let config = EngineConfig {
            lookahead_interval_ms: 0,
            schedule_ahead_secs: -1.0,
            start_offset_secs: 0.0,
            volume: 3.0,
            log_level: "chatty".to_string(),
            ..EngineConfig::default()
        };

        assert_eq!(config.lookahead_interval(), Duration::from_millis(1));
        assert_eq!(config.schedule_ahead_secs(), 0.1);
        assert_eq!(config.start_offset_secs(), 0.05);
        assert_eq!(config.volume(), 1.0);
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_window_stays_larger_than_interval() {
        let config = EngineConfig {
            lookahead_interval_ms: 200,
            schedule_ahead_secs: 0.1,
            ..EngineConfig::default()
        };
        assert!(config.schedule_ahead_secs() > config.lookahead_interval().as_secs_f64());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(EngineConfig::FILE_NAME);

        let config = EngineConfig {
            lookahead_interval_ms: 10,
            volume: 0.8,
            log_level: "debug".to_string(),
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EngineConfig::FILE_NAME);
        std::fs::write(&path, "(volume: 0.25)").unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.volume, 0.25);
        assert_eq!(loaded.lookahead_interval_ms, 25);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EngineConfig::FILE_NAME);
        std::fs::write(&path, "(volume: \"loud\")").unwrap();

        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
