use std::fmt;

use rollchain_condition::Condition;

use crate::chain::Chain;
use crate::error::WorkError;
use crate::params::Params;

/// Forward or backward work of a task.
pub type Work = Box<dyn FnMut(&mut Params) -> Result<(), WorkError>>;

/// Work that does nothing, for tasks that only enforce a condition or have
/// nothing to undo.
///
/// # Errors
///
/// Never fails.
pub fn passthrough(_params: &mut Params) -> Result<(), WorkError> {
    Ok(())
}

pub(crate) enum TaskKind {
    Single { forward: Work, backward: Work },
    Group(Vec<Task>),
}

/// How far a task got during the current execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Progress {
    /// Forward work has not been attempted.
    #[default]
    Idle,
    /// Forward work completed.
    Executed,
    /// Forward work was attempted and failed; a group may have completed
    /// some of its members.
    Failed,
}

/// A named unit of work with its compensation.
///
/// A task is either a single forward/backward pair or a group of child tasks
/// that occupies one position in a [`Chain`].
pub struct Task {
    pub(crate) name: String,
    pub(crate) condition: Condition,
    pub(crate) kind: TaskKind,
    pub(crate) progress: Progress,
}

impl Task {
    /// Creates a task from its forward work and the backward work undoing it.
    #[must_use]
    pub fn new<F, B>(name: impl Into<String>, forward: F, backward: B) -> Self
    where
        F: FnMut(&mut Params) -> Result<(), WorkError> + 'static,
        B: FnMut(&mut Params) -> Result<(), WorkError> + 'static,
    {
        Self {
            name: name.into(),
            condition: Condition::default(),
            kind: TaskKind::Single {
                forward: Box::new(forward),
                backward: Box::new(backward),
            },
            progress: Progress::Idle,
        }
    }

    /// Combines `tasks` into one atomic chain node.
    ///
    /// Forward work runs every member's forward work in order and stops at the
    /// first failure. Backward work runs the members' backward work in the
    /// same order and stops at the first failure.
    #[must_use]
    pub fn group(name: impl Into<String>, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            name: name.into(),
            condition: Condition::default(),
            kind: TaskKind::Group(tasks.into_iter().collect()),
            progress: Progress::Idle,
        }
    }

    /// Attaches the condition that must hold before forward work runs.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub(crate) fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    /// Starts a chain with this task followed by `next`.
    #[must_use]
    pub fn then(self, next: impl Into<Chain>) -> Chain {
        Chain::from(self).then(next)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, TaskKind::Group(_))
    }

    /// Members of a group, empty for a single task.
    #[must_use]
    pub fn members(&self) -> &[Task] {
        match &self.kind {
            TaskKind::Group(tasks) => tasks,
            TaskKind::Single { .. } => &[],
        }
    }

    pub(crate) fn members_mut(&mut self) -> &mut [Task] {
        match &mut self.kind {
            TaskKind::Group(tasks) => tasks,
            TaskKind::Single { .. } => &mut [],
        }
    }

    pub(crate) fn reset_progress(&mut self) {
        self.progress = Progress::Idle;
        for member in self.members_mut() {
            member.reset_progress();
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .field("members", &self.members())
            .finish_non_exhaustive()
    }
}
