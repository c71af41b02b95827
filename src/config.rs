//! Engine configuration and discovery
//!
//! Configuration is looked up in this order:
//! 1. `$SLOTPLAN_CONFIG`
//! 2. Current directory: ./slotplan.toml or ./.slotplan/config.toml
//! 3. Built-in defaults

use crate::schedule::{
    AllocatorSettings, CyclePolicy, DEFAULT_WORKDAY_MINUTES, SchedulingConstraints, SettingsError,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SLOTPLAN_CONFIG";

/// Settings shared by every scheduling request an engine serves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workday length used to compute utilization
    pub assumed_workday_minutes: u32,
    pub cycle_policy: CyclePolicy,
    /// Constraints applied when a caller does not supply its own
    pub constraints: SchedulingConstraints,
    pub allocator: AllocatorSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assumed_workday_minutes: DEFAULT_WORKDAY_MINUTES,
            cycle_policy: CyclePolicy::default(),
            constraints: SchedulingConstraints::default(),
            allocator: AllocatorSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string, rejecting unusable settings
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), SettingsError> {
        self.allocator.validate()?;
        self.constraints.validate()
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Convert configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load the first config file found, or the defaults
    pub fn discover() -> Result<EngineConfig> {
        if let Some(path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", path);
            return EngineConfig::from_toml_file(path);
        }

        info!("No configuration file found, using defaults");
        Ok(EngineConfig::default())
    }

    /// Find configuration file using the discovery order
    pub fn find_config_file() -> Option<PathBuf> {
        Self::config_candidates().into_iter().find(|candidate| {
            debug!("Checking for config file: {:?}", candidate);
            candidate.is_file()
        })
    }

    /// Configuration file candidates in priority order
    pub fn config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            candidates.push(PathBuf::from(explicit));
        }

        if let Ok(current_dir) = env::current_dir() {
            candidates.extend(Self::directory_candidates(&current_dir));
        }

        candidates
    }

    /// Config locations inside a single directory
    pub fn directory_candidates(dir: &Path) -> Vec<PathBuf> {
        vec![
            dir.join("slotplan.toml"),
            dir.join(".slotplan").join("config.toml"),
        ]
    }

    /// Print the discovery order and which file is active
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::config_candidates().iter().enumerate() {
            let status = if candidate.is_file() {
                "EXISTS"
            } else if candidate.exists() {
                "NOT A FILE"
            } else {
                "NOT FOUND"
            };
            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            assumed_workday_minutes = 360
            cycle_policy = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.assumed_workday_minutes, 360);
        assert_eq!(config.cycle_policy, CyclePolicy::Reject);
        assert_eq!(config.constraints, SchedulingConstraints::default());
        assert_eq!(config.allocator.default_task_duration, Duration::hours(1));
    }

    #[test]
    fn test_directory_candidates_order() {
        let dir = TempDir::new().unwrap();
        let candidates = ConfigDiscovery::directory_candidates(dir.path());
        assert_eq!(candidates[0], dir.path().join("slotplan.toml"));
        assert_eq!(candidates[1], dir.path().join(".slotplan/config.toml"));
    }

    #[test]
    fn test_backwards_restriction_step_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [allocator]
            restriction_step = -900
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("Invalid configuration"));
        assert_eq!(
            err.downcast_ref::<SettingsError>(),
            Some(&SettingsError::NonPositiveStep(-900))
        );
    }

    #[test]
    fn test_negative_break_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [constraints]
            break_duration = -60
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SettingsError>(),
            Some(&SettingsError::NegativeBreak(-60))
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = EngineConfig::from_toml_str("assumed_workday_minutes = \"eight hours\"")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }
}
