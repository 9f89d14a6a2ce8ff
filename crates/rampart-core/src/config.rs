//! Engine configuration
//!
//! Loaded from TOML, then overridden by `RAMPART_*` environment variables,
//! then validated. Every field has a default so an empty document is valid.

use crate::errors::{AuthorizationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "RAMPART_";

/// How action sets from different groups combine on the same resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// A later group's action set replaces an earlier one (last write wins)
    #[default]
    Replace,
    /// Action sets are unioned across groups
    Union,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Replace => f.write_str("replace"),
            MergePolicy::Union => f.write_str("union"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "union" => Ok(MergePolicy::Union),
            other => Err(AuthorizationError::config(format!(
                "unknown merge policy `{other}`"
            ))),
        }
    }
}

/// Permission engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether role-based enforcement is active for the account
    pub rbac_enabled: bool,
    /// Cross-group merge behavior for per-resource action sets
    pub merge_policy: MergePolicy,
    /// Maximum number of cached permission indexes
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rbac_enabled: true,
            merge_policy: MergePolicy::Replace,
            cache_capacity: 10_000,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)
            .map_err(|e| AuthorizationError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthorizationError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `RAMPART_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `RAMPART_*` overrides from an explicit variable list
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "RBAC_ENABLED" => {
                    self.rbac_enabled = value.trim().parse().map_err(|_| {
                        AuthorizationError::config(format!("{key} must be true or false"))
                    })?;
                }
                "MERGE_POLICY" => self.merge_policy = value.parse()?,
                "CACHE_CAPACITY" => {
                    self.cache_capacity = value.trim().parse().map_err(|_| {
                        AuthorizationError::config(format!("{key} must be an unsigned integer"))
                    })?;
                }
                _ => {
                    tracing::debug!(variable = %key, "Ignoring unknown configuration override");
                }
            }
        }
        self.validate()
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(AuthorizationError::config(
                "cache_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}
