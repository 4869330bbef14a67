//! Opening conflicted files in an external editor.

use tracing::{info, warn};

use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::git::runner::CommandRunner;

/// Opens files for the user. Best-effort: callers report failures but never
/// change course because of them.
pub trait Editor {
    fn open(&self, paths: &[String]) -> Result<(), EditorError>;
}

/// Launches a configured editor command with the paths appended.
pub struct CommandEditor<'a> {
    runner: &'a dyn CommandRunner,
    command: String,
    args: Vec<String>,
}

impl<'a> CommandEditor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &EditorConfig) -> Self {
        Self {
            runner,
            command: config.command.trim().to_string(),
            args: config.args.clone(),
        }
    }
}

impl Editor for CommandEditor<'_> {
    fn open(&self, paths: &[String]) -> Result<(), EditorError> {
        if self.command.is_empty() {
            return Err(EditorError::Disabled);
        }
        let argv: Vec<&str> = self
            .args
            .iter()
            .chain(paths.iter())
            .map(String::as_str)
            .collect();

        let output = self
            .runner
            .run(&self.command, &argv)
            .map_err(|source| EditorError::LaunchFailed {
                command: self.command.clone(),
                source,
            })?;
        if !output.success() {
            warn!(command = %self.command, exit_code = output.exit_code, "editor exited with failure");
            return Err(EditorError::Exited {
                command: self.command.clone(),
                exit_code: output.exit_code,
            });
        }
        info!(command = %self.command, count = paths.len(), "opened conflicted files");
        Ok(())
    }
}
