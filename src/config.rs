//! Solver limits, loadable from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Cap on local rewrite passes when tidying results that the canonical form cannot handle.
    pub max_rewrite_passes: usize,
    /// Highest derivative order accepted.
    pub max_order: u32,
    /// Highest polynomial degree in an undetermined-coefficients forcing term.
    pub max_trial_degree: u32,
    /// Classify requests that carry no equation type.
    pub auto_detect: bool,
    /// Substitute every solution back into its equation before returning it.
    pub verify_solutions: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_rewrite_passes: 16,
            max_order: 4,
            max_trial_degree: 6,
            auto_detect: true,
            verify_solutions: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SolverConfig {
    /// Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: "solver", path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> String {
        // every field is a plain scalar, so serialization cannot fail
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SolverConfig::from_toml_str("max_order = 2\nauto_detect = false\n").unwrap();
        assert_eq!(config.max_order, 2);
        assert!(!config.auto_detect);
        assert_eq!(config.max_trial_degree, 6);
    }

    #[test]
    fn defaults_survive_a_round_trip() {
        let text = SolverConfig::default().to_toml_string();
        assert_eq!(SolverConfig::from_toml_str(&text).unwrap(), SolverConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(SolverConfig::from_toml_str("max_order = \"four\"").is_err());
    }
}
