//! Configuration file support for Tally.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/tally/config.toml`.

use crate::gpa::default_grading_scale;
use crate::{Error, GradeBand, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub attendance: AttendanceConfig,

    #[serde(default)]
    pub calculator: CalculatorConfig,

    #[serde(default)]
    pub gpa: GpaConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Target used by the stats view
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttendanceConfig {
    #[serde(default = "default_target")]
    pub target: i64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
        }
    }
}

/// Starting values of the quick calculator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculatorConfig {
    #[serde(default = "default_calc_total")]
    pub total: i64,

    #[serde(default = "default_calc_attended")]
    pub attended: i64,

    #[serde(default = "default_target")]
    pub target: i64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            total: default_calc_total(),
            attended: default_calc_attended(),
            target: default_target(),
        }
    }
}

/// Grading scale used to turn percentages into grade points
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GpaConfig {
    #[serde(default = "default_grading_scale")]
    pub scale: Vec<GradeBand>,
}

impl Default for GpaConfig {
    fn default() -> Self {
        Self {
            scale: default_grading_scale(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("tally")
}

fn default_target() -> i64 {
    75
}

fn default_calc_total() -> i64 {
    40
}

fn default_calc_attended() -> i64 {
    32
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the views cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.attendance.target) {
            return Err(Error::Config(format!(
                "attendance.target must be between 1 and 100, got {}",
                self.attendance.target
            )));
        }
        if self.gpa.scale.is_empty() {
            return Err(Error::Config("gpa.scale must not be empty".into()));
        }
        if self
            .gpa
            .scale
            .windows(2)
            .any(|pair| pair[0].min < pair[1].min)
        {
            return Err(Error::Config(
                "gpa.scale must be ordered from highest to lowest min".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("tally").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
