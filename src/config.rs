//! Container configuration.
//!
//! [`ContainerConfig`] can be built in code, parsed from JSON, or read from
//! any [`ConfigSource`]; [`EnvironmentConfigSource`] maps keys onto
//! environment variables with an optional prefix. Every loader validates
//! before returning.

use std::env;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{ResolveError, ResolveResult};

/// Raw key/value source for configuration.
pub trait ConfigSource {
    /// Looks up a lowercase key such as `max_depth`.
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment variable configuration source
#[derive(Debug, Default, Clone)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Keys are looked up as `{PREFIX}_{KEY}`, both uppercased.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn variable(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.variable(key)).ok()
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: AHashMap<String, String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Settings for a [`Context`](crate::Context).
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::ContainerConfig;
///
/// let config = ContainerConfig::from_json_str(r#"{ "max_depth": 16 }"#).unwrap();
/// assert_eq!(config.max_depth, 16);
/// assert!(config.report_not_found);
///
/// assert!(ContainerConfig::from_json_str(r#"{ "max_depth": 0 }"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Deepest allowed chain of nested factory resolutions.
    pub max_depth: usize,
    /// Forward not-found diagnostics to observers.
    pub report_not_found: bool,
    /// Pool size used by `preload_prefab_default`.
    pub default_preload: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            report_not_found: true,
            default_preload: 0,
        }
    }
}

impl ContainerConfig {
    pub const MAX_DEPTH_LIMIT: usize = 1024;

    pub fn from_json_str(json: &str) -> ResolveResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ResolveError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `{PREFIX}_MAX_DEPTH`, `{PREFIX}_REPORT_NOT_FOUND` and
    /// `{PREFIX}_DEFAULT_PRELOAD`; unset variables keep their defaults.
    pub fn from_env(prefix: &str) -> ResolveResult<Self> {
        Self::from_source(&EnvironmentConfigSource::with_prefix(prefix))
    }

    pub fn from_source(source: &dyn ConfigSource) -> ResolveResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = source.get("max_depth") {
            config.max_depth = parse_usize("max_depth", &raw)?;
        }
        if let Some(raw) = source.get("report_not_found") {
            config.report_not_found = parse_bool("report_not_found", &raw)?;
        }
        if let Some(raw) = source.get("default_preload") {
            config.default_preload = parse_usize("default_preload", &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ResolveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ResolveError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> ResolveResult<()> {
        if self.max_depth == 0 || self.max_depth > Self::MAX_DEPTH_LIMIT {
            return Err(ResolveError::InvalidConfig(format!(
                "max_depth must be between 1 and {}, got {}",
                Self::MAX_DEPTH_LIMIT,
                self.max_depth
            )));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> ResolveResult<usize> {
    raw.trim()
        .parse()
        .map_err(|_| ResolveError::InvalidConfig(format!("{key}: expected an integer, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> ResolveResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ResolveError::InvalidConfig(format!(
            "{key}: expected a boolean, got {raw:?}"
        ))),
    }
}
