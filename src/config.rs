use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorldConfig {
    /// Seed for a new world. `None` picks a random one.
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    /// Where `FileStorage` keeps the save. Defaults to the platform data dir.
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            streaming: StreamingConfig::default(),
            autosave: AutosaveConfig::default(),
            save_dir: None,
        }
    }
}

impl WorldConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(default_save_dir)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamingConfig {
    /// Chebyshev radius, in chunks, that must always be resident.
    #[serde(default = "default_radius")]
    pub radius: i32,
    /// Extra chunks kept beyond `radius` before eviction.
    #[serde(default = "default_hysteresis")]
    pub hysteresis: i32,
    /// Cap on chunks materialised per tick. `None` fills the radius every tick.
    #[serde(default)]
    pub max_chunks_per_tick: Option<usize>,
    /// Background generation threads. 0 generates on the tick thread.
    #[serde(default)]
    pub workers: usize,
}

fn default_radius() -> i32 {
    STREAM_RADIUS
}

fn default_hysteresis() -> i32 {
    STREAM_HYSTERESIS
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            radius: STREAM_RADIUS,
            hysteresis: STREAM_HYSTERESIS,
            max_chunks_per_tick: None,
            workers: 0,
        }
    }
}

impl StreamingConfig {
    /// Offloaded generation on every core but one, with a frame budget.
    pub fn threaded() -> Self {
        Self {
            max_chunks_per_tick: Some(8),
            workers: num_cpus::get().saturating_sub(1).max(1),
            ..Self::default()
        }
    }

    pub fn evict_distance(&self) -> i32 {
        self.radius + self.hysteresis.max(0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub interval_secs: f32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: AUTOSAVE_INTERVAL_SECS,
        }
    }
}

pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "cubeworld")
        .map(|dirs| dirs.data_dir().join("world"))
        .unwrap_or_else(|| PathBuf::from("world"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threaded_uses_workers_and_a_budget() {
        let config = StreamingConfig::threaded();
        assert!(config.workers >= 1);
        assert!(config.workers < num_cpus::get().max(2));
        assert_eq!(config.max_chunks_per_tick, Some(8));
        assert_eq!(config.radius, STREAM_RADIUS);
        assert_eq!(config.evict_distance(), 5);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = WorldConfig::from_toml("").unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.streaming, StreamingConfig::default());
        assert_eq!(config.streaming.evict_distance(), 5);
        assert!(config.autosave.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = WorldConfig::from_toml(
            r#"
            seed = 42
            save_dir = "saves/a"

            [streaming]
            radius = 6
            max_chunks_per_tick = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.streaming.radius, 6);
        assert_eq!(config.streaming.hysteresis, STREAM_HYSTERESIS);
        assert_eq!(config.streaming.max_chunks_per_tick, Some(3));
        assert_eq!(config.resolved_save_dir(), PathBuf::from("saves/a"));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            WorldConfig::from_toml("streaming = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
