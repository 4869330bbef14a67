//! Interactive confirmation backed by dialoguer.

use dialoguer::Confirm;
use tracing::warn;

use branchsync_core::prompt::Confirmer;

/// Asks on the terminal. Any I/O failure counts as "no".
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        match Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }
}
