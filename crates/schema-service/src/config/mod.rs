//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

/// The conventions section of a configuration file, with everything else
/// ignored.
#[derive(Deserialize)]
struct ConventionsSection {
    #[serde(default)]
    conventions: Conventions,
}

impl Conventions {
    /// Load only the `conventions` section of a configuration file.
    ///
    /// The `database` section may be absent or incomplete; it is neither
    /// required nor validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse the `conventions` section from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let conventions = if yaml.trim().is_empty() {
            Conventions::default()
        } else {
            serde_yaml::from_str::<ConventionsSection>(yaml)?.conventions
        };
        validation::validate_conventions(&conventions)?;
        Ok(conventions)
    }
}
