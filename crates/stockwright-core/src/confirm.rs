//! Operator acknowledgement for destructive actions.

/// Blocking yes/no acknowledgement requested before a destructive remote call.
///
/// Returning `false` means the action must not be issued.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// The operator has already said yes (e.g. answered a dialog).
#[derive(Debug, Clone, Copy, Default)]
pub struct Acknowledged;

impl Confirm for Acknowledged {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// The operator has not confirmed; every prompt is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct Declined;

impl Confirm for Declined {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Ask for confirmation and log the answer.
pub(crate) fn ask(confirm: &dyn Confirm, prompt: &str) -> bool {
    let answer = confirm.confirm(prompt);
    tracing::debug!(prompt, answer, "confirmation");
    answer
}
