use std::path::Path;

use indexmap::IndexMap;
use rollchain_condition::Condition;
use serde::Deserialize;

use crate::error::ConfigError;

/// Settings applied to a chain with [`Chain::configure`](crate::Chain::configure).
///
/// ```toml
/// rollback-prompt = "roll back the deployment"
/// auto-response = "y"
///
/// [conditions.deploy]
/// key = "env"
/// value = "prod|staging"
/// comparison = "m"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ChainConfig {
    rollback_prompt: Option<String>,
    auto_response: Option<String>,
    conditions: IndexMap<String, Condition>,
}

impl ChainConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the document is not valid TOML or has
    /// unknown keys or malformed conditions.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn rollback_prompt(&self) -> Option<&str> {
        self.rollback_prompt.as_deref()
    }

    #[must_use]
    pub fn auto_response(&self) -> Option<&str> {
        self.auto_response.as_deref()
    }

    /// Conditions keyed by task name.
    #[must_use]
    pub fn conditions(&self) -> &IndexMap<String, Condition> {
        &self.conditions
    }

    #[must_use]
    pub fn with_condition(mut self, task: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(task.into(), condition);
        self
    }

    #[must_use]
    pub fn with_auto_response(mut self, answer: impl Into<String>) -> Self {
        self.auto_response = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_rollback_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.rollback_prompt = Some(prompt.into());
        self
    }
}
