use std::io::{BufRead, IsTerminal, StdinLock, Stdout, Write};

use dialoguer::Input;
use rollchain::Confirm;
use tracing::debug;

/// Environment variable that makes [`TerminalConfirm`] prompt even when stdin
/// is not a terminal.
const FORCE_TTY_ENV: &str = "ROLLCHAIN_FORCE_TTY";

/// Whether prompts can be shown on this process's terminal.
#[must_use]
pub fn is_interactive() -> bool {
    std::env::var(FORCE_TTY_ENV).is_ok() || std::io::stdin().is_terminal()
}

/// Asks for rollback confirmation with a dialoguer text prompt.
///
/// Without a terminal no question is asked and the rollback is declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        if !is_interactive() {
            debug!("stdin is not a terminal, declining rollback prompt");
            return None;
        }

        let answer = Input::<String>::new()
            .with_prompt(format!("{prompt} (y/n)"))
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(answer) => Some(answer),
            Err(dialoguer::Error::IO(error)) => {
                debug!(%error, "failed to read rollback answer");
                None
            }
        }
    }
}

/// Asks for rollback confirmation by writing the prompt and reading one line.
pub struct ReaderConfirm<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ReaderConfirm<R, W> {
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl ReaderConfirm<StdinLock<'static>, Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for ReaderConfirm<R, W> {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        if let Err(error) = write!(self.writer, "{prompt} (y/n)? ").and_then(|()| self.writer.flush())
        {
            debug!(%error, "failed to write rollback prompt");
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let answer = line.trim_end_matches(['\n', '\r']);
                (!answer.is_empty()).then(|| answer.to_string())
            }
            Err(error) => {
                debug!(%error, "failed to read rollback answer");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_one_line_per_prompt() {
        let mut confirm = ReaderConfirm::new(Cursor::new("yes\nno\n"), Vec::new());

        assert_eq!(confirm.ask("roll back").as_deref(), Some("yes"));
        assert_eq!(confirm.ask("roll back").as_deref(), Some("no"));

        let (_, written) = confirm.into_inner();
        assert_eq!(
            String::from_utf8_lossy(&written),
            "roll back (y/n)? roll back (y/n)? "
        );
    }

    #[test]
    fn empty_line_and_eof_give_no_answer() {
        let mut confirm = ReaderConfirm::new(Cursor::new("\r\n"), Vec::new());

        assert_eq!(confirm.ask("roll back"), None);
        assert_eq!(confirm.ask("roll back"), None);
    }
}
