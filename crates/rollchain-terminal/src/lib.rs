//! Terminal front end for rollchain: rollback prompts and status lines.

mod confirm;
mod console;

pub use confirm::{ReaderConfirm, TerminalConfirm, is_interactive};
pub use console::ConsoleObserver;
