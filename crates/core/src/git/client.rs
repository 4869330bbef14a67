//! Version-control operations issued through a [`CommandRunner`].

use tracing::{debug, info, instrument, warn};

use super::classify::classify_push_result;
use super::runner::{CommandOutput, CommandRunner};
use crate::config::GitConfig;
use crate::errors::GitError;
use crate::models::{BranchName, PushOutcome};

const GIT_ENV: &[(&str, &str)] = &[("LC_ALL", "C")];

/// High-level git client. Every method issues exactly one command.
pub struct GitClient<'a> {
    runner: &'a dyn CommandRunner,
    binary: String,
    remote: String,
    fetch_all: bool,
}

impl<'a> GitClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &GitConfig) -> Self {
        Self {
            runner,
            binary: config.binary.clone(),
            remote: config.remote.clone(),
            fetch_all: config.fetch_all,
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Fetch all remotes, or only the configured one.
    #[instrument(skip(self))]
    pub fn fetch(&self) -> Result<(), GitError> {
        if self.fetch_all {
            info!("fetching all remotes");
            self.run_checked(&["fetch", "--all"])?;
        } else {
            info!(remote = %self.remote, "fetching");
            self.run_checked(&["fetch", &self.remote])?;
        }
        debug!("fetch completed");
        Ok(())
    }

    #[instrument(skip(self, branch), fields(branch = %branch))]
    pub fn checkout(&self, branch: &BranchName) -> Result<(), GitError> {
        self.run_checked(&["checkout", branch.as_str()])?;
        debug!("checked out");
        Ok(())
    }

    /// Merge `branch` into HEAD. The raw output is returned so the caller
    /// can classify a failure against the post-merge repository state.
    #[instrument(skip(self, branch), fields(branch = %branch))]
    pub fn merge(&self, branch: &BranchName) -> Result<CommandOutput, GitError> {
        info!("merging");
        self.run_raw(&["merge", "--no-edit", branch.as_str()])
    }

    #[instrument(skip(self, branch), fields(branch = %branch))]
    pub fn push(&self, branch: &BranchName) -> PushOutcome {
        info!(remote = %self.remote, "pushing");
        let outcome = classify_push_result(self.run_raw(&["push", &self.remote, branch.as_str()]));
        if outcome != PushOutcome::Accepted {
            warn!(?outcome, "push not accepted");
        }
        outcome
    }

    /// Merge the remote's copy of `branch` into HEAD without rebasing and
    /// without opening an editor for the merge message.
    #[instrument(skip(self, branch), fields(branch = %branch))]
    pub fn pull(&self, branch: &BranchName) -> Result<(), GitError> {
        info!(remote = %self.remote, "pulling");
        self.run_checked(&[
            "pull",
            &self.remote,
            branch.as_str(),
            "--no-rebase",
            "--no-edit",
        ])?;
        Ok(())
    }

    /// True while a merge (or the merge half of a pull) awaits resolution.
    pub fn merge_in_progress(&self) -> bool {
        matches!(
            self.run_raw(&["rev-parse", "-q", "--verify", "MERGE_HEAD"]),
            Ok(out) if out.success()
        )
    }

    /// Throw away an unfinished merge and restore the pre-merge tree.
    #[instrument(skip(self))]
    pub fn merge_abort(&self) -> Result<(), GitError> {
        warn!("aborting unfinished merge");
        self.run_checked(&["merge", "--abort"])?;
        Ok(())
    }

    /// Run a git command and hand back its output whatever the exit code.
    ///
    /// Output is forced into the C locale so classification sees git's
    /// untranslated messages.
    pub(crate) fn run_raw(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.runner.run_env(&self.binary, args, GIT_ENV)
    }

    /// Run a git command, turning a non-zero exit into an error.
    pub(crate) fn run_checked(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run_raw(args)?;
        if !output.success() {
            return Err(GitError::CommandFailed {
                exit_code: output.exit_code,
                stderr: output.message(),
            });
        }
        Ok(output.stdout)
    }
}
