//! User configuration for SimAuto sessions.
//!
//! Stored in `~/.saw/config.toml`. Every section is optional; anything left
//! out takes its default.

use saw_core::{SawError, SawResult, Tolerance};
use saw_transport::Binding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Object types whose schema is fetched when a session starts.
pub const DEFAULT_PREWARM: [&str; 5] = ["bus", "gen", "load", "shunt", "branch"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SawConfig {
    /// How to reach the engine.
    pub bridge: BridgeConfig,

    /// Session start-up behaviour.
    pub session: SessionConfig,

    /// Verified-write comparison.
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Explicit bridge executable. When unset the bridge is looked up in
    /// `~/.saw/bin`, then on `PATH`.
    pub binary: Option<PathBuf>,

    pub binding: Binding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ui_visible: bool,

    /// Whether writes create objects that do not exist yet.
    pub create_if_not_found: bool,

    /// Object types to cache schema for at start-up.
    pub prewarm: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ui_visible: false,
            create_if_not_found: false,
            prewarm: DEFAULT_PREWARM.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let tolerance = Tolerance::default();
        Self {
            abs_tolerance: tolerance.abs,
            rel_tolerance: tolerance.rel,
        }
    }
}

impl VerifyConfig {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            abs: self.abs_tolerance,
            rel: self.rel_tolerance,
        }
    }
}

impl SawConfig {
    /// Get the default config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".saw"))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> SawResult<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> SawResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| SawError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> SawResult<()> {
        let path = Self::config_path()
            .ok_or_else(|| SawError::Config("could not determine config directory".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> SawResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| SawError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Render as TOML, for display.
    pub fn to_toml(&self) -> SawResult<String> {
        toml::to_string_pretty(self).map_err(|e| SawError::Config(e.to_string()))
    }
}
