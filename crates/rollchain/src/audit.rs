use std::time::Instant;

use crate::event::{Observer, TaskEvent};

/// Which kind of work a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Rollback,
}

/// Outcome of a recorded piece of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskStatus {
    /// Work started and has not finished.
    Started,
    /// Forward work succeeded.
    Executed,
    /// Forward work failed.
    Failed,
    /// The condition was not met; forward work was skipped.
    Rejected,
    /// Backward work succeeded.
    Compensated,
    /// Backward work failed.
    CompensationFailed,
    /// Rollback was declined at this task.
    Aborted,
}

/// One forward or backward run of a task.
#[derive(Debug)]
pub struct TaskRecord {
    /// Name of the task.
    pub name: String,
    /// Whether this was forward work or a compensation.
    pub direction: Direction,
    /// Latest status reported for this run.
    pub status: TaskStatus,
    /// Error message, if the run failed or was rejected.
    pub error: Option<String>,
    /// When the run was first recorded.
    pub started_at: Instant,
    /// When the run finished, if it did.
    pub completed_at: Option<Instant>,
}

/// Ordered history of everything a chain execution did.
#[derive(Debug, Default)]
pub struct ChainAuditLog {
    records: Vec<TaskRecord>,
}

impl ChainAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { task, rollback } => {
                self.push(task, direction(*rollback), TaskStatus::Started, None);
            }
            TaskEvent::Finished {
                task,
                rollback,
                error,
            } => {
                let status = match (rollback, error.is_some()) {
                    (false, false) => TaskStatus::Executed,
                    (false, true) => TaskStatus::Failed,
                    (true, false) => TaskStatus::Compensated,
                    (true, true) => TaskStatus::CompensationFailed,
                };
                self.complete(task, direction(*rollback), status, error.clone());
            }
            TaskEvent::ValidationFailed { task, error } => {
                self.complete(
                    task,
                    Direction::Forward,
                    TaskStatus::Rejected,
                    Some(error.clone()),
                );
            }
            TaskEvent::Aborted { task } => {
                self.push(task, Direction::Rollback, TaskStatus::Aborted, None);
            }
        }
    }

    fn push(
        &mut self,
        name: &str,
        direction: Direction,
        status: TaskStatus,
        error: Option<String>,
    ) {
        let now = Instant::now();
        self.records.push(TaskRecord {
            name: name.to_string(),
            direction,
            status,
            error,
            started_at: now,
            completed_at: (status != TaskStatus::Started).then_some(now),
        });
    }

    /// Completes the open record for `name`, or appends a finished one when
    /// the work was never reported as started.
    fn complete(
        &mut self,
        name: &str,
        direction: Direction,
        status: TaskStatus,
        error: Option<String>,
    ) {
        let open = self.records.iter_mut().rev().find(|r| {
            r.name == name && r.direction == direction && r.status == TaskStatus::Started
        });

        match open {
            Some(record) => {
                record.status = status;
                record.error = error;
                record.completed_at = Some(Instant::now());
            }
            None => self.push(name, direction, status, error),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    /// Names of tasks whose forward work ran, in execution order.
    #[must_use]
    pub fn forward(&self) -> Vec<&str> {
        self.names_where(|r| {
            r.direction == Direction::Forward
                && matches!(r.status, TaskStatus::Executed | TaskStatus::Failed)
        })
    }

    /// Names of tasks whose backward work ran, in execution order.
    #[must_use]
    pub fn compensated(&self) -> Vec<&str> {
        self.names_where(|r| {
            r.direction == Direction::Rollback
                && matches!(
                    r.status,
                    TaskStatus::Compensated | TaskStatus::CompensationFailed
                )
        })
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.status == TaskStatus::Aborted)
    }

    fn names_where(&self, keep: impl Fn(&TaskRecord) -> bool) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| keep(r))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// One line per record, prefixed with a status marker.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                TaskStatus::Started => "…",
                TaskStatus::Executed => "✓",
                TaskStatus::Failed => "✗",
                TaskStatus::Rejected => "⊘",
                TaskStatus::Compensated => "↩",
                TaskStatus::CompensationFailed => "⚠",
                TaskStatus::Aborted => "■",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}

impl Observer for ChainAuditLog {
    fn notify(&mut self, event: &TaskEvent) {
        self.record(event);
    }
}

fn direction(rollback: bool) -> Direction {
    if rollback {
        Direction::Rollback
    } else {
        Direction::Forward
    }
}
