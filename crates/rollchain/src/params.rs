use indexmap::IndexMap;
use rollchain_condition::{ParamSource, Value};

use crate::error::ChainError;

/// Traversal state of a chain execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Tasks run their forward work, head to tail.
    #[default]
    Running,
    /// Tasks run their backward work, back toward the head.
    Rollback,
    /// Rollback was declined; nothing else runs.
    Exit,
}

/// Execution context shared by every task of one chain execution.
///
/// Holds caller data alongside the engine's phase and the error recorded when
/// a task failed. A `Params` belongs to exactly one execution at a time and
/// must not be submitted to two chains concurrently.
#[derive(Debug, Default)]
pub struct Params {
    values: IndexMap<String, Value>,
    phase: Phase,
    last_error: Option<ChainError>,
}

impl Params {
    /// Empty parameters in the [`Phase::Running`] phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// String value of `key`, or `""` when absent or not a string.
    #[must_use]
    pub fn str_or_empty(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Boolean value of `key`, or `default` when absent or not a boolean.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Integer value of `key`, or `default` when absent or not an integer.
    #[must_use]
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(Value::as_int).unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Forces the traversal phase. Work that sets [`Phase::Rollback`] turns
    /// the chain around after the current task.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Error recorded by the failing task, until it is handed back to the caller.
    #[must_use]
    pub fn last_error(&self) -> Option<&ChainError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<ChainError> {
        self.last_error.take()
    }

    pub(crate) fn record_error(&mut self, error: ChainError) {
        self.last_error = Some(error);
    }

    pub(crate) fn finish(&mut self) -> Result<(), ChainError> {
        self.take_error().map_or(Ok(()), Err)
    }
}

impl ParamSource for Params {
    fn param(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
