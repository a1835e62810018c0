// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Read from a YAML file at `$REELNOTES_CONFIG`, or `reelnotes/config.yaml`
//! under the platform config directory. Every field has a default, so a
//! partial file (or none at all) is fine.

use crate::lifecycle::LifecycleConfig;
use crate::models::tags::{default_catalog, TagDef};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "REELNOTES_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the project store lives. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub autosave_debounce_ms: u64,
    pub snapshot_tolerance_secs: f64,
    /// Length given to still images, which have no duration of their own.
    pub still_duration_secs: f64,
    pub toast_secs: f64,
    pub hold_to_confirm_ms: u64,
    pub thumbnail_size: u32,
    pub tags: Vec<TagDef>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_debounce_ms: 300,
            snapshot_tolerance_secs: 0.1,
            still_duration_secs: 10.0,
            toast_secs: 4.0,
            hold_to_confirm_ms: 800,
            thumbnail_size: 240,
            tags: default_catalog(),
        }
    }
}

impl AppConfig {
    /// Load from the default location, falling back to defaults when the
    /// file is missing.
    pub fn load() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config.validated())
    }

    /// Replace out-of-range values with defaults.
    fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !(self.snapshot_tolerance_secs > 0.0) {
            log::warn!("Ignoring snapshot_tolerance_secs {}", self.snapshot_tolerance_secs);
            self.snapshot_tolerance_secs = defaults.snapshot_tolerance_secs;
        }
        if !(self.still_duration_secs > 0.0) {
            self.still_duration_secs = defaults.still_duration_secs;
        }
        if !(self.toast_secs > 0.0) {
            self.toast_secs = defaults.toast_secs;
        }
        if self.thumbnail_size == 0 {
            self.thumbnail_size = defaults.thumbnail_size;
        }
        if self.tags.is_empty() {
            self.tags = defaults.tags;
        }
        self
    }

    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            tolerance: self.snapshot_tolerance_secs,
            debounce: Duration::from_millis(self.autosave_debounce_ms),
        }
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs_f64(self.toast_secs)
    }

    pub fn hold_to_confirm(&self) -> Duration {
        Duration::from_millis(self.hold_to_confirm_ms)
    }

    /// Store directory: configured, else platform data dir, else local.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("reelnotes")))
            .unwrap_or_else(|| PathBuf::from("reelnotes-data"))
    }
}

fn default_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("reelnotes").join("config.yaml")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "autosave_debounce_ms: 500\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.autosave_debounce_ms, 500);
        assert_eq!(config.snapshot_tolerance_secs, 0.1);
        assert_eq!(config.lifecycle().debounce, Duration::from_millis(500));
        assert!(!config.tags.is_empty());
    }

    #[test]
    fn test_custom_tags_and_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "snapshot_tolerance_secs: -1\ntags:\n  - id: dmp\n    label: DMP\n    color: [1, 2, 3]\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.snapshot_tolerance_secs, 0.1);
        assert_eq!(config.tags.len(), 1);
        assert_eq!(config.tags[0].label, "DMP");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tags: [unterminated").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_configured_store_dir_wins() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/srv/reelnotes")),
            ..Default::default()
        };
        assert_eq!(config.store_dir(), PathBuf::from("/srv/reelnotes"));
    }
}
