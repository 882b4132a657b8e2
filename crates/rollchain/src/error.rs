use std::path::PathBuf;

use rollchain_condition::ConditionError;
use thiserror::Error;

/// Error returned by forward and backward work.
pub type WorkError = Box<dyn std::error::Error + Send + Sync>;

/// Error from chain execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChainError {
    /// A task's condition was not met, so its forward work never ran.
    #[error("condition not met for task '{task}'")]
    Validation {
        /// Name of the task (or group member) whose condition failed.
        task: String,
        #[source]
        source: ConditionError,
    },

    /// A task's forward work failed.
    #[error("task '{task}' failed")]
    Work {
        /// Name of the task (or group member) that failed.
        task: String,
        #[source]
        source: WorkError,
    },

    /// A task's backward work failed; rollback stopped at this task.
    #[error("compensation failed for task '{task}'")]
    Compensation {
        /// Name of the task (or group member) whose compensation failed.
        task: String,
        #[source]
        source: WorkError,
    },

    /// Execution was requested from a position outside the chain.
    #[error("no task at position {index} in a chain of {len}")]
    UnknownTask { index: usize, len: usize },
}

impl ChainError {
    /// Name of the task the error originated from, if any.
    #[must_use]
    pub fn task(&self) -> Option<&str> {
        match self {
            Self::Validation { task, .. }
            | Self::Work { task, .. }
            | Self::Compensation { task, .. } => Some(task),
            Self::UnknownTask { .. } => None,
        }
    }
}

/// Error loading or applying a [`ChainConfig`](crate::ChainConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read chain config '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid chain config")]
    Parse(#[from] toml::de::Error),

    #[error("chain config names unknown task '{name}'")]
    UnknownTask { name: String },
}
