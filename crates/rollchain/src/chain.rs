use std::fmt;

use rollchain_condition::Condition;
use tracing::{debug, warn};

use crate::audit::ChainAuditLog;
use crate::config::ChainConfig;
use crate::confirm::{Confirm, NonInteractive, is_affirmative};
use crate::error::{ChainError, ConfigError};
use crate::event::{Observer, TaskEvent};
use crate::params::{Params, Phase};
use crate::task::{Progress, Task, TaskKind};

/// Prompt shown when a failed chain asks whether to roll back.
pub const DEFAULT_ROLLBACK_PROMPT: &str = "would you like to rollback";

/// An ordered sequence of tasks executed head to tail and compensated tail
/// to head.
///
/// Tasks are stored by position: the head is position 0, the tail is the last
/// position, and a task's neighbours are the positions next to it.
///
/// If any task fails, the chain asks its [`Confirm`] provider whether to roll
/// back. An affirmative answer is cached as the chain's auto-response, so the
/// question is asked at most once. Rollback then runs the backward work of the
/// failed task and of every task before it. Declining stops the chain where it
/// is, leaving completed work in place.
pub struct Chain {
    tasks: Vec<Task>,
    hooks: Hooks,
}

struct Hooks {
    confirm: Box<dyn Confirm>,
    observers: Vec<Box<dyn Observer>>,
    auto_response: Option<String>,
    prompt: String,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            confirm: Box::new(NonInteractive),
            observers: Vec::new(),
            auto_response: None,
            prompt: DEFAULT_ROLLBACK_PROMPT.to_string(),
        }
    }
}

impl Hooks {
    fn emit(&mut self, audit: &mut ChainAuditLog, event: TaskEvent) {
        match &event {
            TaskEvent::Started { task, rollback } => {
                debug!(task = %task, rollback, "task started");
            }
            TaskEvent::Finished {
                task,
                rollback,
                error: None,
            } => {
                debug!(task = %task, rollback, "task finished");
            }
            TaskEvent::Finished {
                task,
                rollback,
                error: Some(error),
            } => {
                warn!(task = %task, rollback, error = %error, "task failed");
            }
            TaskEvent::ValidationFailed { task, error } => {
                warn!(task = %task, error = %error, "task condition not met");
            }
            TaskEvent::Aborted { task } => {
                warn!(task = %task, "rollback declined, chain aborted");
            }
        }

        audit.record(&event);
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }

    fn confirm_rollback(&mut self) -> bool {
        if let Some(answer) = &self.auto_response {
            debug!(answer = %answer, "using cached rollback answer");
            return is_affirmative(answer);
        }

        let Some(answer) = self.confirm.ask(&self.prompt) else {
            debug!("no rollback answer available");
            return false;
        };

        let confirmed = is_affirmative(&answer);
        if confirmed {
            self.auto_response = Some(answer);
        }
        confirmed
    }
}

impl Chain {
    /// Creates a chain holding a single task.
    #[must_use]
    pub fn new(task: Task) -> Self {
        Self {
            tasks: vec![task],
            hooks: Hooks::default(),
        }
    }

    /// Appends a task, or every task of another chain, after the tail.
    ///
    /// The appended chain's observers are kept. Its auto-response is adopted
    /// when this chain has none; its confirmation provider and prompt are
    /// dropped.
    #[must_use]
    pub fn then(mut self, next: impl Into<Chain>) -> Self {
        let next = next.into();
        self.tasks.extend(next.tasks);
        self.hooks.observers.extend(next.hooks.observers);
        if self.hooks.auto_response.is_none() {
            self.hooks.auto_response = next.hooks.auto_response;
        }
        self
    }

    /// Sets the provider asked whether to roll back. Defaults to
    /// [`NonInteractive`], which declines.
    #[must_use]
    pub fn with_confirmation(mut self, confirm: impl Confirm + 'static) -> Self {
        self.hooks.confirm = Box::new(confirm);
        self
    }

    /// Adds an observer that receives every [`TaskEvent`].
    #[must_use]
    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.hooks.observers.push(Box::new(observer));
        self
    }

    /// Pre-seeds the rollback answer so no prompt is shown.
    #[must_use]
    pub fn with_auto_response(mut self, answer: impl Into<String>) -> Self {
        self.set_auto_response(answer);
        self
    }

    pub fn set_auto_response(&mut self, answer: impl Into<String>) {
        self.hooks.auto_response = Some(answer.into());
    }

    pub fn clear_auto_response(&mut self) {
        self.hooks.auto_response = None;
    }

    #[must_use]
    pub fn auto_response(&self) -> Option<&str> {
        self.hooks.auto_response.as_deref()
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.hooks.prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.hooks.prompt
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always `false`: a chain holds at least one task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of the top-level tasks, head first.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(Task::name)
    }

    /// Position of the top-level task called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name() == name)
    }

    /// Applies a configuration: prompt, auto-response and task conditions.
    ///
    /// Conditions are matched by name against top-level tasks and group
    /// members.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownTask` if a condition names a task that is
    /// not part of the chain. Nothing is changed in that case.
    pub fn configure(&mut self, config: &ChainConfig) -> Result<(), ConfigError> {
        for name in config.conditions().keys() {
            if find_task(&self.tasks, name).is_none() {
                return Err(ConfigError::UnknownTask { name: name.clone() });
            }
        }

        for (name, condition) in config.conditions() {
            if let Some(task) = find_task_mut(&mut self.tasks, name) {
                task.set_condition(condition.clone());
            }
        }
        if let Some(prompt) = config.rollback_prompt() {
            self.hooks.prompt = prompt.to_string();
        }
        if let Some(answer) = config.auto_response() {
            self.hooks.auto_response = Some(answer.to_string());
        }
        Ok(())
    }

    /// Executes the chain from the head.
    ///
    /// # Errors
    ///
    /// Returns the error of the task that failed, even after a complete
    /// rollback. If a compensation fails, rollback stops there and the
    /// `ChainError::Compensation` is returned instead; the original error is
    /// left in [`Params::last_error`]. When rollback is declined the original
    /// error is returned and `params.phase()` is [`Phase::Exit`].
    pub fn exec(&mut self, params: &mut Params) -> Result<(), ChainError> {
        self.exec_from(0, params)
    }

    /// Executes the chain starting at `index`, in the phase `params` is in.
    ///
    /// # Errors
    ///
    /// Same as [`Chain::exec`], plus `ChainError::UnknownTask` for an index
    /// past the tail.
    pub fn exec_from(&mut self, index: usize, params: &mut Params) -> Result<(), ChainError> {
        let (result, _audit_log) = self.execute_internal(index, params);
        result
    }

    /// Executes the chain from the head and returns an audit log of every
    /// forward and backward run.
    pub fn exec_with_audit(
        &mut self,
        params: &mut Params,
    ) -> (Result<(), ChainError>, ChainAuditLog) {
        self.execute_internal(0, params)
    }

    /// Forces the chain into rollback and compensates from the tail.
    ///
    /// # Errors
    ///
    /// Returns a `ChainError::Compensation` if any backward work fails, or an
    /// error already recorded in `params`.
    pub fn rollback(&mut self, params: &mut Params) -> Result<(), ChainError> {
        params.set_phase(Phase::Rollback);
        self.exec_from(self.tasks.len() - 1, params)
    }

    fn execute_internal(
        &mut self,
        start: usize,
        params: &mut Params,
    ) -> (Result<(), ChainError>, ChainAuditLog) {
        let mut audit_log = ChainAuditLog::new();

        let len = self.tasks.len();
        if start >= len {
            return (Err(ChainError::UnknownTask { index: start, len }), audit_log);
        }

        for task in &mut self.tasks {
            task.reset_progress();
        }

        let mut index = start;
        loop {
            if let Err(error) = self.handle(index, params, &mut audit_log) {
                return (Err(error), audit_log);
            }

            match params.phase() {
                Phase::Exit => break,
                Phase::Rollback => match index.checked_sub(1) {
                    Some(prev) => index = prev,
                    None => break,
                },
                Phase::Running if index + 1 < len => index += 1,
                Phase::Running => break,
            }
        }

        debug!(phase = ?params.phase(), "chain finished");
        (params.finish(), audit_log)
    }

    /// Runs the phase-appropriate work of the task at `index`.
    fn handle(
        &mut self,
        index: usize,
        params: &mut Params,
        audit_log: &mut ChainAuditLog,
    ) -> Result<(), ChainError> {
        let Self { tasks, hooks } = self;
        let task = &mut tasks[index];

        match params.phase() {
            Phase::Exit => Ok(()),
            Phase::Running => match run_forward(task, hooks, audit_log, params) {
                Ok(()) => Ok(()),
                Err(error) => {
                    params.record_error(error);
                    params.set_phase(Phase::Rollback);
                    if task.progress == Progress::Idle {
                        // Condition failed before any work ran; the previous
                        // task is the first to compensate.
                        Ok(())
                    } else {
                        compensate(task, hooks, audit_log, params)
                    }
                }
            },
            Phase::Rollback => compensate(task, hooks, audit_log, params),
        }
    }
}

impl From<Task> for Chain {
    fn from(task: Task) -> Self {
        Self::new(task)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("tasks", &self.tasks)
            .field("auto_response", &self.hooks.auto_response)
            .field("prompt", &self.hooks.prompt)
            .finish_non_exhaustive()
    }
}

fn compensate(
    task: &mut Task,
    hooks: &mut Hooks,
    audit_log: &mut ChainAuditLog,
    params: &mut Params,
) -> Result<(), ChainError> {
    if !hooks.confirm_rollback() {
        params.set_phase(Phase::Exit);
        hooks.emit(
            audit_log,
            TaskEvent::Aborted {
                task: task.name.clone(),
            },
        );
        return Ok(());
    }
    run_backward(task, hooks, audit_log, params)
}

fn check_condition(
    name: &str,
    condition: &Condition,
    hooks: &mut Hooks,
    audit_log: &mut ChainAuditLog,
    params: &Params,
) -> Result<(), ChainError> {
    condition.validate(params).map_err(|source| {
        hooks.emit(
            audit_log,
            TaskEvent::ValidationFailed {
                task: name.to_string(),
                error: source.to_string(),
            },
        );
        ChainError::Validation {
            task: name.to_string(),
            source,
        }
    })
}

/// Validates and runs a task's forward work. Group members run in order and
/// the first failure stops the group.
fn run_forward(
    task: &mut Task,
    hooks: &mut Hooks,
    audit_log: &mut ChainAuditLog,
    params: &mut Params,
) -> Result<(), ChainError> {
    let Task {
        name,
        condition,
        kind,
        progress,
    } = task;

    match kind {
        TaskKind::Single { forward, .. } => {
            hooks.emit(
                audit_log,
                TaskEvent::Started {
                    task: name.clone(),
                    rollback: false,
                },
            );
            check_condition(name, condition, hooks, audit_log, params)?;

            let result = forward(params);
            *progress = if result.is_ok() {
                Progress::Executed
            } else {
                Progress::Failed
            };
            hooks.emit(
                audit_log,
                TaskEvent::Finished {
                    task: name.clone(),
                    rollback: false,
                    error: result.as_ref().err().map(ToString::to_string),
                },
            );
            result.map_err(|source| ChainError::Work {
                task: name.clone(),
                source,
            })
        }
        TaskKind::Group(members) => {
            check_condition(name, condition, hooks, audit_log, params)?;

            *progress = Progress::Failed;
            for member in members.iter_mut() {
                run_forward(member, hooks, audit_log, params)?;
            }
            *progress = Progress::Executed;
            Ok(())
        }
    }
}

/// Runs a task's backward work. A group compensates, in order, the members
/// that ran in this execution, or all of them if the group itself never ran;
/// the first failure stops it.
fn run_backward(
    task: &mut Task,
    hooks: &mut Hooks,
    audit_log: &mut ChainAuditLog,
    params: &mut Params,
) -> Result<(), ChainError> {
    let Task {
        name,
        kind,
        progress,
        ..
    } = task;

    match kind {
        TaskKind::Single { backward, .. } => {
            hooks.emit(
                audit_log,
                TaskEvent::Started {
                    task: name.clone(),
                    rollback: true,
                },
            );
            let result = backward(params);
            hooks.emit(
                audit_log,
                TaskEvent::Finished {
                    task: name.clone(),
                    rollback: true,
                    error: result.as_ref().err().map(ToString::to_string),
                },
            );
            result.map_err(|source| ChainError::Compensation {
                task: name.clone(),
                source,
            })
        }
        TaskKind::Group(members) => {
            let entered = *progress != Progress::Idle;
            for member in members.iter_mut() {
                let ran = match member.progress {
                    Progress::Executed => true,
                    Progress::Failed => member.is_group(),
                    Progress::Idle => false,
                };
                if !entered || ran {
                    run_backward(member, hooks, audit_log, params)?;
                }
            }
            Ok(())
        }
    }
}

fn find_task<'a>(tasks: &'a [Task], name: &str) -> Option<&'a Task> {
    tasks.iter().find_map(|task| {
        if task.name() == name {
            Some(task)
        } else {
            find_task(task.members(), name)
        }
    })
}

fn find_task_mut<'a>(tasks: &'a mut [Task], name: &str) -> Option<&'a mut Task> {
    for task in tasks {
        if task.name == name {
            return Some(task);
        }
        if let Some(found) = find_task_mut(task.members_mut(), name) {
            return Some(found);
        }
    }
    None
}
