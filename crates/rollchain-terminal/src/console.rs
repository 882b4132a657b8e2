use std::io::{Stdout, Write};

use rollchain::{Observer, TaskEvent};
use tracing::warn;

/// Prints task events as status lines.
///
/// ```text
/// START task 'deploy'
/// FAIL task 'deploy'
/// BEGINNING ROLLBACK
///     ERROR: connection refused
/// ROLLBACK - START task 'deploy'
/// ROLLBACK - DONE task 'deploy'
/// ```
pub struct ConsoleObserver<W> {
    writer: W,
}

impl ConsoleObserver<Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn render(event: &TaskEvent) -> String {
    match event {
        TaskEvent::Started { task, rollback } => {
            format!("{}START task '{task}'", rollback_prefix(*rollback))
        }
        TaskEvent::Finished {
            task,
            rollback,
            error: None,
        } => format!("{}DONE task '{task}'", rollback_prefix(*rollback)),
        TaskEvent::Finished {
            task,
            rollback: false,
            error: Some(error),
        } => format!("FAIL task '{task}'\nBEGINNING ROLLBACK\n\tERROR: {error}"),
        TaskEvent::Finished {
            task,
            rollback: true,
            error: Some(error),
        } => format!("ROLLBACK - FAIL task '{task}'\n\tERROR: {error}"),
        TaskEvent::ValidationFailed { task, error } => {
            format!("VALIDATION FAIL task '{task}':\n\tERROR: {error}")
        }
        TaskEvent::Aborted { task } => format!("ROLLBACK DECLINED at task '{task}'"),
        _ => format!("task '{}'", event.task()),
    }
}

fn rollback_prefix(rollback: bool) -> &'static str {
    if rollback { "ROLLBACK - " } else { "" }
}

impl<W: Write> Observer for ConsoleObserver<W> {
    fn notify(&mut self, event: &TaskEvent) {
        if let Err(error) = writeln!(self.writer, "{}", render(event)) {
            warn!(%error, "failed to write task status");
        }
    }
}
