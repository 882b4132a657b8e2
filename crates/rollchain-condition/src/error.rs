use thiserror::Error;

use crate::condition::{Combinator, motive_suffix};
use crate::value::Value;

/// A failed child of an XOR or OR composite.
#[derive(Debug, Clone)]
pub struct BranchFailure {
    /// Description of the child condition.
    pub description: String,
    /// Why the child did not pass.
    pub reason: ConditionError,
}

/// Why a condition is not satisfied.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConditionError {
    #[error("missing param: {key}{}", motive_suffix(.motive.as_deref()))]
    MissingParam { key: String, motive: Option<String> },

    #[error("empty/missing param '{key}'{}", motive_suffix(.motive.as_deref()))]
    EmptyParam { key: String, motive: Option<String> },

    #[error(
        "param '{key}' did not match expected '{expected}' ({actual}){}",
        motive_suffix(.motive.as_deref())
    )]
    Mismatch {
        key: String,
        expected: Value,
        actual: Value,
        motive: Option<String>,
    },

    #[error(
        "param '{key}' did not match expected pattern '{pattern}' ({actual}){}",
        motive_suffix(.motive.as_deref())
    )]
    PatternMismatch {
        key: String,
        pattern: String,
        actual: String,
        motive: Option<String>,
    },

    #[error(
        "invalid regex pattern '{pattern}' for condition '{key}'{}",
        motive_suffix(.motive.as_deref())
    )]
    InvalidPattern {
        key: String,
        pattern: String,
        motive: Option<String>,
        #[source]
        source: regex::Error,
    },

    #[error(
        "param '{key}' value '{actual}' is not a string and cannot match pattern '{pattern}'{}",
        motive_suffix(.motive.as_deref())
    )]
    NotText {
        key: String,
        pattern: String,
        actual: Value,
        motive: Option<String>,
    },

    #[error(
        "parameter '{key}' was specified when not expected{}",
        motive_suffix(.motive.as_deref())
    )]
    Unexpected { key: String, motive: Option<String> },

    #[error(
        "parameter '{key}' value '{actual}' matched '{expected}' when inequality expected{}",
        motive_suffix(.motive.as_deref())
    )]
    InequalityMatched {
        key: String,
        expected: Value,
        actual: Value,
        motive: Option<String>,
    },

    #[error("2+ XOR param(s): {}{}", .matched.join(", "), motive_suffix(.motive.as_deref()))]
    MultipleXor {
        matched: Vec<String>,
        motive: Option<String>,
    },

    #[error(
        "invalid/missing {combinator} param(s): {}{}\n\tREASON:\n\t{}",
        join_descriptions(.failures),
        motive_suffix(.motive.as_deref()),
        join_reasons(.failures)
    )]
    Aggregate {
        combinator: Combinator,
        failures: Vec<BranchFailure>,
        motive: Option<String>,
    },
}

impl ConditionError {
    /// Branch failures carried by an aggregate error, empty otherwise.
    #[must_use]
    pub fn failures(&self) -> &[BranchFailure] {
        match self {
            Self::Aggregate { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn join_descriptions(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(|f| f.description.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_reasons(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(|f| f.reason.to_string())
        .collect::<Vec<_>>()
        .join("\n\t")
}
