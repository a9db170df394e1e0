use std::path::{Path, PathBuf};

use crate::engine::{BoardSize, EngineError};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("input.min_swipe_distance must be a non-negative number, got {0}")]
    SwipeDistance(f32),
}

/// Shell configuration, usually read from a TOML file.
///
/// ```toml
/// board_size = 5
/// save_path = "saves/game.g2s"
/// log = "debug"
///
/// [input]
/// min_swipe_distance = 40.0
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Config {
    #[serde(default = "defaults::board_size")]
    pub board_size: usize,
    /// Fixed RNG seed for reproducible games. None seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    /// Tracing filter, e.g. "info", "grid_2048=debug".
    #[serde(default = "defaults::log")]
    pub log: String,
    #[serde(default)]
    pub input: Input,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Input {
    #[serde(default = "defaults::min_swipe_distance")]
    pub min_swipe_distance: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_size: defaults::board_size(),
            seed: None,
            save_path: None,
            log: defaults::log(),
            input: Input::default(),
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self { min_swipe_distance: defaults::min_swipe_distance() }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the engine would refuse later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        BoardSize::new(self.board_size)?;
        let min = self.input.min_swipe_distance;
        if !min.is_finite() || min < 0.0 {
            return Err(ConfigError::SwipeDistance(min));
        }
        Ok(())
    }
}

mod defaults {
    pub fn board_size() -> usize { 4 }
    pub fn log() -> String { "info".to_string() }
    pub fn min_swipe_distance() -> f32 { crate::input::DEFAULT_MIN_SWIPE_DISTANCE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.board_size, 4);
        assert_eq!(cfg.input.min_swipe_distance, 30.0);
    }

    #[test]
    fn parses_all_fields() {
        let cfg = Config::from_toml_str(
            r#"
            board_size = 6
            seed = 99
            save_path = "saves/game.json"
            log = "debug"

            [input]
            min_swipe_distance = 12.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.board_size, 6);
        assert_eq!(cfg.seed, Some(99));
        assert_eq!(cfg.save_path, Some(PathBuf::from("saves/game.json")));
        assert_eq!(cfg.log, "debug");
        assert_eq!(cfg.input.min_swipe_distance, 12.5);
    }

    #[test]
    fn rejects_unsupported_board_size() {
        let err = Config::from_toml_str("board_size = 8").unwrap_err();
        assert!(matches!(err, ConfigError::Engine(EngineError::UnsupportedSize(8))));
    }

    #[test]
    fn rejects_negative_swipe_distance() {
        let err = Config::from_toml_str("[input]\nmin_swipe_distance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::SwipeDistance(d) if d == -1.0));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.toml");
        std::fs::write(&path, "board_size = 5\n").unwrap();
        assert_eq!(Config::from_toml(&path).unwrap().board_size, 5);
        assert!(matches!(Config::from_toml(dir.path().join("nope.toml")), Err(ConfigError::Io(_))));
    }
}
