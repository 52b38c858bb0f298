//! Container configuration.
//!
//! Settings come from code (builder methods), from environment variables
//! (`BEANPOD_*`) or, with the `config` feature, from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_ALLOW_OVERRIDING: &str = "BEANPOD_ALLOW_OVERRIDING";
const ENV_PRE_INSTANTIATE: &str = "BEANPOD_PRE_INSTANTIATE";
const ENV_MAX_DEPTH: &str = "BEANPOD_MAX_DEPTH";

/// Errors loading a [`ContainerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[cfg(feature = "config")]
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Container behavior switches.
///
/// # Examples
///
/// ```
/// use beanpod::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .allow_definition_overriding(true)
///     .max_resolution_depth(64);
/// assert!(config.allows_definition_overriding());
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().resolution_depth_limit(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Let a manually registered definition replace a scanned one with the
    /// same id. Off by default: every duplicate id is rejected.
    pub allow_definition_overriding: bool,
    /// Run `pre_instantiate_singletons` as part of `seal`
    pub pre_instantiate_on_seal: bool,
    /// Deepest dependency chain a single lookup may build
    pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            allow_definition_overriding: false,
            pre_instantiate_on_seal: false,
            max_resolution_depth: 1024,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_definition_overriding = allow;
        self
    }

    pub fn pre_instantiate_on_seal(mut self, eager: bool) -> Self {
        self.pre_instantiate_on_seal = eager;
        self
    }

    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth.max(1);
        self
    }

    pub fn allows_definition_overriding(&self) -> bool {
        self.allow_definition_overriding
    }

    pub fn resolution_depth_limit(&self) -> usize {
        self.max_resolution_depth
    }

    /// Defaults overridden by `BEANPOD_ALLOW_OVERRIDING`,
    /// `BEANPOD_PRE_INSTANTIATE` and `BEANPOD_MAX_DEPTH` when set.
    ///
    /// Booleans accept `true/false/1/0/yes/no/on/off`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(allow) = env_bool(ENV_ALLOW_OVERRIDING)? {
            config.allow_definition_overriding = allow;
        }
        if let Some(eager) = env_bool(ENV_PRE_INSTANTIATE)? {
            config.pre_instantiate_on_seal = eager;
        }
        if let Ok(value) = env::var(ENV_MAX_DEPTH) {
            match value.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_resolution_depth = depth,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_MAX_DEPTH,
                        value,
                    })
                }
            }
        }
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn env_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(ENV_ALLOW_OVERRIDING);
        env::remove_var(ENV_PRE_INSTANTIATE);
        env::remove_var(ENV_MAX_DEPTH);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        assert_eq!(ContainerConfig::from_env().unwrap(), ContainerConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var(ENV_ALLOW_OVERRIDING, "yes");
        env::set_var(ENV_PRE_INSTANTIATE, "1");
        env::set_var(ENV_MAX_DEPTH, "32");

        let config = ContainerConfig::from_env().unwrap();
        assert!(config.allow_definition_overriding);
        assert!(config.pre_instantiate_on_seal);
        assert_eq!(config.max_resolution_depth, 32);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        env::set_var(ENV_MAX_DEPTH, "deep");
        let err = ContainerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_MAX_DEPTH, .. }));

        env::set_var(ENV_MAX_DEPTH, "0");
        assert!(ContainerConfig::from_env().is_err());

        clear_env();
        env::set_var(ENV_PRE_INSTANTIATE, "maybe");
        assert!(ContainerConfig::from_env().is_err());
        clear_env();
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_json_partial() {
        let config = ContainerConfig::from_json(r#"{ "allow_definition_overriding": true }"#).unwrap();
        assert!(config.allow_definition_overriding);
        assert!(!config.pre_instantiate_on_seal);
        assert_eq!(config.max_resolution_depth, 1024);
    }
}
