//! Yes/no confirmation collaborator.

/// Asks the user a yes/no question.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes without asking. Used when confirmation is disabled and in
/// non-interactive contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
