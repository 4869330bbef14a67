//! Classifying a failed forward merge.
//!
//! A merge that stops with unmerged paths is a conflict: the files are
//! opened for the user and the merge is left exactly as git left it. The
//! handler never resolves, never picks a side, and never runs
//! `git merge --abort`.

use std::path::Path;

use tracing::{info, warn};

use super::editor::Editor;
use crate::errors::GitError;
use crate::git::classify::classify_merge;
use crate::git::client::GitClient;
use crate::git::inspector::RepositoryInspector;
use crate::git::runner::CommandOutput;
use crate::models::{BranchName, MergeOutcome};
use crate::report::{ProgressReporter, SyncEvent};

pub struct MergeConflictHandler<'g, 'a> {
    git: &'g GitClient<'a>,
    editor: &'a dyn Editor,
}

impl<'g, 'a> MergeConflictHandler<'g, 'a> {
    pub fn new(git: &'g GitClient<'a>, editor: &'a dyn Editor) -> Self {
        Self { git, editor }
    }

    /// Classify the merge of `branch` that produced `attempt`.
    pub fn classify(
        &self,
        branch: &BranchName,
        attempt: Result<CommandOutput, GitError>,
        reporter: &mut dyn ProgressReporter,
    ) -> MergeOutcome {
        let output = match attempt {
            Ok(output) => output,
            Err(e) => {
                let message = e.to_string();
                reporter.on_event(&SyncEvent::MergeFailed {
                    branch: branch.clone(),
                    message: message.clone(),
                });
                return MergeOutcome::OtherFailure(message);
            }
        };
        if output.success() {
            return MergeOutcome::Clean;
        }

        let inspector = RepositoryInspector::new(self.git);
        let outcome = match inspector.conflicted_files() {
            Ok(files) => classify_merge(&output, &files),
            Err(e) => MergeOutcome::OtherFailure(format!(
                "{} (could not list conflicted files: {})",
                output.message(),
                e
            )),
        };

        match &outcome {
            MergeOutcome::ConflictedFiles(files) => {
                warn!(branch = %branch, count = files.len(), "merge conflict");
                reporter.on_event(&SyncEvent::MergeConflict {
                    branch: branch.clone(),
                    files: files.clone(),
                });
                self.open_in_editor(files, reporter);
            }
            MergeOutcome::OtherFailure(message) => {
                warn!(branch = %branch, %message, "merge failed");
                reporter.on_event(&SyncEvent::MergeFailed {
                    branch: branch.clone(),
                    message: message.clone(),
                });
            }
            MergeOutcome::Clean => {}
        }
        outcome
    }

    fn open_in_editor(&self, files: &[String], reporter: &mut dyn ProgressReporter) {
        // Unmerged paths are relative to the top level, which may not be the
        // directory the editor is started in.
        let paths: Vec<String> = match self.git.run_checked(&["rev-parse", "--show-toplevel"]) {
            Ok(top) if !top.trim().is_empty() => files
                .iter()
                .map(|f| Path::new(top.trim()).join(f).display().to_string())
                .collect(),
            _ => files.to_vec(),
        };

        match self.editor.open(&paths) {
            Ok(()) => {
                info!(count = paths.len(), "opened conflicted files in editor");
                reporter.on_event(&SyncEvent::EditorOpened { count: paths.len() });
            }
            Err(e) => reporter.on_event(&SyncEvent::EditorFailed {
                message: e.to_string(),
            }),
        }
    }
}
