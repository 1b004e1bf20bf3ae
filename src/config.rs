//! Configuration management for dependi-versions

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::requirement::Requirement;
use crate::scheme::{Ecosystem, VersionScheme};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Tool configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Ecosystem used when none is given on the command line
    pub ecosystem: Ecosystem,
    /// Versions to skip, per dependency
    pub ignore: Vec<IgnoreCondition>,
}

/// Versions of matching dependencies that must never be proposed
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IgnoreCondition {
    /// Dependency name, `*` matches any run of characters
    pub dependency_name: String,
    /// Requirement strings (`>= 17.10`, `[2.0,3.0)`)
    pub versions: Vec<String>,
}

impl IgnoreCondition {
    /// Whether this condition applies to `name`.
    pub fn matches(&self, name: &str) -> bool {
        let pattern = self.dependency_name.as_str();
        let parts: Vec<&str> = pattern.split('*').collect();
        let [first, middle @ .., last] = parts.as_slice() else {
            return name == pattern;
        };

        let Some(mut rest) = name.strip_prefix(*first) else {
            return false;
        };
        for part in middle {
            match rest.find(*part) {
                Some(idx) => rest = &rest[idx + part.len()..],
                None => return false,
            }
        }
        // Suffix is checked on what's left so it can't overlap the prefix
        rest.ends_with(*last)
    }
}

impl Config {
    /// Parse configuration from a JSON value, falling back to defaults
    pub fn from_json(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Ignore requirements that apply to `dependency_name`.
    ///
    /// Each entry may be a union of ranges and contributes one requirement
    /// per alternative. Unparseable entries are logged and skipped.
    pub fn ignored_requirements<S: VersionScheme>(
        &self,
        dependency_name: &str,
    ) -> Vec<Requirement<S>> {
        self.ignore
            .iter()
            .filter(|condition| condition.matches(dependency_name))
            .flat_map(|condition| condition.versions.iter())
            .filter_map(|versions| match Requirement::<S>::requirements_array(versions) {
                Ok(requirements) => Some(requirements),
                Err(e) => {
                    tracing::warn!(
                        "Skipping ignore condition {:?} for {}: {}",
                        versions,
                        dependency_name,
                        e
                    );
                    None
                }
            })
            .flatten()
            .collect()
    }
}
