//! Configuration management for adsequencer
//!
//! Options use the same camelCase names ad integrations pass to the plugin
//! (`timeout`, `prerollTimeout`, `postrollTimeout`, `debug`, `stitchedAds`).
//! They are loaded from defaults, an optional TOML or JSON file and
//! `ADSEQ_*` environment variables, in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::utils::error::{AdsError, IntoAdsError, Result};

/// Ad sequencing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdsConfig {
    /// Deadline in ms for `ads-ready?` before giving up on ads
    pub timeout: u64,

    /// Deadline in ms for the preroll decision
    pub preroll_timeout: u64,

    /// Deadline in ms for the postroll decision
    pub postroll_timeout: u64,

    /// Log every state transition
    pub debug: bool,

    /// Ads are stitched into the content stream
    pub stitched_ads: bool,

    /// Live streams may keep playing (muted) behind ads
    pub live_cue_points: bool,

    /// Platform stores live positions as an offset behind the live edge
    pub live_offset_tracking: bool,

    /// Platform needs the surface hidden while a content play is cancelled
    pub hide_surface_during_guard: bool,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            timeout: 5000,
            preroll_timeout: 100,
            postroll_timeout: 100,
            debug: false,
            stitched_ads: false,
            live_cue_points: true,
            live_offset_tracking: false,
            hide_surface_during_guard: false,
        }
    }
}

impl AdsConfig {
    /// Load configuration
    ///
    /// Sources are applied in order (later sources override earlier):
    /// 1. Default values
    /// 2. The given file, parsed as JSON for `.json` and TOML otherwise
    /// 3. Environment variables (ADSEQ_* prefix)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file, filling missing keys with defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .config_err("Failed to read config file")?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            serde_json::from_str(&contents).config_err("Failed to parse config file")
        } else {
            toml::from_str(&contents).config_err("Failed to parse config file")
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(timeout) = std::env::var("ADSEQ_TIMEOUT") {
            self.timeout = timeout.parse()
                .map_err(|_| AdsError::Config("Invalid ADSEQ_TIMEOUT".to_string()))?;
        }

        if let Ok(timeout) = std::env::var("ADSEQ_PREROLL_TIMEOUT") {
            self.preroll_timeout = timeout.parse()
                .map_err(|_| AdsError::Config("Invalid ADSEQ_PREROLL_TIMEOUT".to_string()))?;
        }

        if let Ok(timeout) = std::env::var("ADSEQ_POSTROLL_TIMEOUT") {
            self.postroll_timeout = timeout.parse()
                .map_err(|_| AdsError::Config("Invalid ADSEQ_POSTROLL_TIMEOUT".to_string()))?;
        }

        if let Ok(debug) = std::env::var("ADSEQ_DEBUG") {
            self.debug = parse_flag(&debug)
                .ok_or_else(|| AdsError::Config("Invalid ADSEQ_DEBUG".to_string()))?;
        }

        if let Ok(stitched) = std::env::var("ADSEQ_STITCHED_ADS") {
            self.stitched_ads = parse_flag(&stitched)
                .ok_or_else(|| AdsError::Config("Invalid ADSEQ_STITCHED_ADS".to_string()))?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let deadlines = [
            ("timeout", self.timeout),
            ("prerollTimeout", self.preroll_timeout),
            ("postrollTimeout", self.postroll_timeout),
        ];

        for (name, value) in deadlines {
            if value == 0 {
                return Err(AdsError::Config(format!("{} must be non-zero", name)));
            }
        }

        Ok(())
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self)
            .config_err("Failed to serialize config")?;

        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Deadline for `ads-ready?`
    pub fn ads_ready_deadline(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Deadline for `preroll?`
    pub fn preroll_deadline(&self) -> Duration {
        Duration::from_millis(self.preroll_timeout)
    }

    /// Deadline for `postroll?`
    pub fn postroll_deadline(&self) -> Duration {
        Duration::from_millis(self.postroll_timeout)
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("adsequencer").join("config.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
