/// Structured progress notification emitted while a chain executes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskEvent {
    /// A task (or group member) is about to run forward or backward work.
    Started { task: String, rollback: bool },
    /// A task (or group member) finished forward or backward work.
    Finished {
        task: String,
        rollback: bool,
        error: Option<String>,
    },
    /// A task's condition was not met; its forward work was skipped.
    ValidationFailed { task: String, error: String },
    /// Rollback was declined at this task; the chain stops here.
    Aborted { task: String },
}

impl TaskEvent {
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Started { task, .. }
            | Self::Finished { task, .. }
            | Self::ValidationFailed { task, .. }
            | Self::Aborted { task } => task,
        }
    }
}

/// Receives every [`TaskEvent`] of a chain execution.
pub trait Observer {
    fn notify(&mut self, event: &TaskEvent);
}

impl<F> Observer for F
where
    F: FnMut(&TaskEvent),
{
    fn notify(&mut self, event: &TaskEvent) {
        self(event);
    }
}
