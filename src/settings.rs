//! User-tunable runtime settings, persisted to `<data_dir>/settings.json`.
//!
//! Owned by an external collaborator per spec.md §1/§6.4; the core only
//! reads it for defaults (`gap_minutes`, `high_load_threshold`,
//! `fatigue_threshold`). Ported from `original_source/engine/settings.py`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    pub high_load_threshold: f64,
    pub fatigue_threshold: f64,
    pub session_gap_minutes: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            short_break_seconds: 300,
            long_break_seconds: 1200,
            high_load_threshold: 0.75,
            fatigue_threshold: 0.85,
            session_gap_minutes: 10.0,
        }
    }
}

/// Thread-safe-by-construction settings file handle: every read re-parses
/// from disk and every write persists immediately, so there is no stale
/// in-memory copy to synchronize.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("settings.json"),
        }
    }

    /// Returns current settings, falling back to defaults if the file is
    /// missing or malformed (unknown keys are ignored on load, matching the
    /// original Python implementation).
    pub fn load(&self) -> Settings {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => merge_onto_defaults(map),
            _ => Settings::default(),
        }
    }

    /// Apply `patch` (unknown keys ignored) on top of the current settings
    /// and persist the full result.
    pub fn update(&self, patch: &serde_json::Value) -> std::io::Result<Settings> {
        let mut current = serde_json::to_value(self.load()).expect("Settings always serializes");
        if let (Some(current_map), Some(patch_map)) = (current.as_object_mut(), patch.as_object())
        {
            for (k, v) in patch_map {
                if current_map.contains_key(k) {
                    current_map.insert(k.clone(), v.clone());
                }
            }
        }
        let merged: Settings = serde_json::from_value(current).unwrap_or_default();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&merged)?)?;
        Ok(merged)
    }
}

fn merge_onto_defaults(map: serde_json::Map<String, serde_json::Value>) -> Settings {
    let mut value = serde_json::to_value(Settings::default()).expect("Settings always serializes");
    if let Some(obj) = value.as_object_mut() {
        for (k, v) in map {
            if obj.contains_key(&k) {
                obj.insert(k, v);
            }
        }
    }
    serde_json::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn update_persists_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let patched = store
            .update(&serde_json::json!({"high_load_threshold": 0.9, "unknown_key": 1}))
            .unwrap();
        assert_eq!(patched.high_load_threshold, 0.9);
        assert_eq!(patched.fatigue_threshold, Settings::default().fatigue_threshold);

        let reloaded = store.load();
        assert_eq!(reloaded, patched);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "not json").unwrap();
        let store = SettingsStore::new(dir.path());
        assert_eq!(store.load(), Settings::default());
    }
}
