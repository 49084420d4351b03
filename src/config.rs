// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! The appliance runs as a single foreground process without flags;
//! everything tunable lives in a JSON file at
//! `<config_dir>/picam/config.json`. Every field has a default, so a missing
//! or partial file is fine, and a malformed one degrades to defaults with a
//! warning instead of refusing to start.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where captured images are stored; defaults to `<pictures>/picam`
    pub save_dir: Option<PathBuf>,
    /// Battery voltage source, a `power_supply`-class sysfs file.
    /// None means no gauge: the battery overlay is simply absent.
    pub gauge_voltage_path: Option<PathBuf>,
    /// Minimum re-trigger interval per button, in milliseconds
    pub debounce_interval_ms: u64,
    /// Gauge re-poll interval, in seconds
    pub gauge_refresh_secs: u64,
    /// Battery voltage mapped to 0%
    pub voltage_empty: f32,
    /// Battery voltage mapped to 100%
    pub voltage_full: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: None,
            gauge_voltage_path: None,
            debounce_interval_ms: constants::DEBOUNCE_INTERVAL.as_millis() as u64,
            gauge_refresh_secs: constants::GAUGE_REFRESH_INTERVAL.as_secs(),
            voltage_empty: constants::VOLTAGE_EMPTY,
            voltage_full: constants::VOLTAGE_FULL,
        }
    }
}

impl Config {
    /// Load the configuration file, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                    Self::default()
                }
            },
            // A missing file is the common case on first run
            Err(_) => Self::default(),
        }
    }

    /// Path of the configuration file, if a config directory exists
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("picam").join("config.json"))
    }

    /// Resolved save directory for captured images
    pub fn save_dir(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
                .join("picam")
        })
    }

    /// Debounce interval as a [`Duration`]
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }

    /// Gauge refresh interval as a [`Duration`]
    pub fn gauge_refresh(&self) -> Duration {
        Duration::from_secs(self.gauge_refresh_secs)
    }
}
