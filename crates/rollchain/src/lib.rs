//! Task chains with compensation and confirmed rollback.
//!
//! A [`Chain`] runs named [`Task`]s in order. Each task has a forward action,
//! a backward (compensating) action and an optional [`Condition`] that must
//! hold before the forward action runs. When a task fails, the chain asks a
//! [`Confirm`] provider whether to roll back and, if so, compensates back
//! toward the head. Several tasks can be combined with [`Task::group`] into
//! one atomic chain node.

mod audit;
mod chain;
mod config;
mod confirm;
mod error;
mod event;
mod params;
mod task;

pub use audit::{ChainAuditLog, Direction, TaskRecord, TaskStatus};
pub use chain::{Chain, DEFAULT_ROLLBACK_PROMPT};
pub use config::ChainConfig;
pub use confirm::{AutoConfirm, Confirm, NonInteractive, is_affirmative};
pub use error::{ChainError, ConfigError, WorkError};
pub use event::{Observer, TaskEvent};
pub use params::{Params, Phase};
pub use rollchain_condition::{Comparison, Composite, Condition, ConditionError, Value};
pub use task::{Task, Work, passthrough};
