/// Asks whether a failed chain should be rolled back.
///
/// Implementations return the raw answer; `None` means no answer could be
/// obtained and is treated as a refusal.
pub trait Confirm {
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self(prompt)
    }
}

/// Never answers, so rollback is always declined unless the chain already
/// holds an auto-response.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Confirm for NonInteractive {
    fn ask(&mut self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Answers every prompt with the same response.
#[derive(Debug, Clone)]
pub struct AutoConfirm(pub String);

impl AutoConfirm {
    #[must_use]
    pub fn yes() -> Self {
        Self("y".to_string())
    }

    #[must_use]
    pub fn no() -> Self {
        Self("n".to_string())
    }
}

impl Confirm for AutoConfirm {
    fn ask(&mut self, _prompt: &str) -> Option<String> {
        Some(self.0.clone())
    }
}

/// An answer is affirmative when its first character, lower-cased, is `y`.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    answer
        .chars()
        .next()
        .is_some_and(|c| c.to_lowercase().eq(['y']))
}
