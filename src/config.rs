//! Central configuration for the cogniflow engine.
//!
//! Loading hierarchy: environment > `cogniflow.toml` > defaults, mirroring
//! the knhk-config crate's layering.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// How often the tick driver recomputes load/context (milliseconds).
    pub inference_interval_ms: u64,
    /// Rolling window for signal smoothing (seconds).
    pub load_history_window_s: u64,
    /// Directory holding the timeline database and settings file.
    pub data_dir: PathBuf,
    /// File name of the timeline SQLite database, relative to `data_dir`.
    pub timeline_db: String,
    /// Default gap (minutes) used by session reconstruction when the caller
    /// doesn't specify one.
    pub default_gap_minutes: f64,
    /// load_score >= this is considered "high load".
    pub high_load_threshold: f64,
    /// load_score >= this is considered "fatigue".
    pub fatigue_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inference_interval_ms: 2000,
            load_history_window_s: 300,
            data_dir: PathBuf::from("./data"),
            timeline_db: "timeline.db".to_string(),
            default_gap_minutes: 10.0,
            high_load_threshold: 0.75,
            fatigue_threshold: 0.85,
        }
    }
}

impl Config {
    /// Load configuration from an optional `cogniflow.toml` in the current
    /// directory, then apply `COGNIFLOW_*` environment variable overrides.
    pub fn load() -> EngineResult<Self> {
        let mut cfg = Self::default();

        let toml_path = PathBuf::from("cogniflow.toml");
        if toml_path.exists() {
            let text = std::fs::read_to_string(&toml_path)?;
            let patch: ConfigFile = toml::from_str(&text)
                .map_err(|e| EngineError::Config(format!("cogniflow.toml: {e}")))?;
            cfg = patch.apply_onto(cfg);
        }

        cfg.apply_env_overrides();
        std::fs::create_dir_all(&cfg.data_dir)?;
        Ok(cfg)
    }

    pub fn timeline_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.timeline_db)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("COGNIFLOW_INFERENCE_INTERVAL_MS") {
            if let Ok(parsed) = v.parse() {
                self.inference_interval_ms = parsed;
            }
        }
        if let Ok(v) = env::var("COGNIFLOW_LOAD_HISTORY_WINDOW_S") {
            if let Ok(parsed) = v.parse() {
                self.load_history_window_s = parsed;
            }
        }
        if let Ok(v) = env::var("COGNIFLOW_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("COGNIFLOW_TIMELINE_DB") {
            self.timeline_db = v;
        }
        if let Ok(v) = env::var("COGNIFLOW_HIGH_LOAD_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.high_load_threshold = parsed;
            }
        }
        if let Ok(v) = env::var("COGNIFLOW_FATIGUE_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.fatigue_threshold = parsed;
            }
        }
    }
}

/// Mirrors [`Config`] with every field optional, so `cogniflow.toml` only
/// needs to name the keys it overrides. Deserialized with `toml::from_str`,
/// same as `knhk-config`'s `load_from_file`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    inference_interval_ms: Option<u64>,
    load_history_window_s: Option<u64>,
    data_dir: Option<PathBuf>,
    timeline_db: Option<String>,
    default_gap_minutes: Option<f64>,
    high_load_threshold: Option<f64>,
    fatigue_threshold: Option<f64>,
}

impl ConfigFile {
    fn apply_onto(self, mut cfg: Config) -> Config {
        if let Some(v) = self.inference_interval_ms {
            cfg.inference_interval_ms = v;
        }
        if let Some(v) = self.load_history_window_s {
            cfg.load_history_window_s = v;
        }
        if let Some(v) = self.data_dir {
            cfg.data_dir = v;
        }
        if let Some(v) = self.timeline_db {
            cfg.timeline_db = v;
        }
        if let Some(v) = self.default_gap_minutes {
            cfg.default_gap_minutes = v;
        }
        if let Some(v) = self.high_load_threshold {
            cfg.high_load_threshold = v;
        }
        if let Some(v) = self.fatigue_threshold {
            cfg.fatigue_threshold = v;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.inference_interval_ms, 2000);
        assert_eq!(cfg.load_history_window_s, 300);
        assert!(cfg.high_load_threshold < cfg.fatigue_threshold);
    }

    #[test]
    fn env_override_takes_precedence() {
        env::set_var("COGNIFLOW_INFERENCE_INTERVAL_MS", "5000");
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.inference_interval_ms, 5000);
        env::remove_var("COGNIFLOW_INFERENCE_INTERVAL_MS");
    }

    #[test]
    fn toml_merge_parses_known_keys() {
        let patch: ConfigFile =
            toml::from_str("inference_interval_ms = 1500\nhigh_load_threshold = 0.8\n").unwrap();
        let cfg = patch.apply_onto(Config::default());
        assert_eq!(cfg.inference_interval_ms, 1500);
        assert_eq!(cfg.high_load_threshold, 0.8);
    }

    #[test]
    fn toml_merge_leaves_unset_fields_at_default() {
        let patch: ConfigFile = toml::from_str("data_dir = \"/tmp/cogniflow\"\n").unwrap();
        let cfg = patch.apply_onto(Config::default());
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/cogniflow"));
        assert_eq!(cfg.inference_interval_ms, Config::default().inference_interval_ms);
    }
}
