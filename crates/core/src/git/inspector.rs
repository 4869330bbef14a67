//! Read-only queries against the live repository.

use tracing::debug;

use super::classify::parse_path_list;
use super::client::GitClient;
use crate::errors::GitError;
use crate::models::BranchName;

/// Answers questions about repository state. Never mutates anything.
pub struct RepositoryInspector<'g, 'a> {
    git: &'g GitClient<'a>,
}

impl<'g, 'a> RepositoryInspector<'g, 'a> {
    pub fn new(git: &'g GitClient<'a>) -> Self {
        Self { git }
    }

    /// Fails closed: any error or non-zero status means "no".
    pub fn is_repository(&self) -> bool {
        matches!(self.git.run_raw(&["status"]), Ok(out) if out.success())
    }

    /// The branch HEAD points at. Detached HEAD is an error.
    pub fn current_branch(&self) -> Result<BranchName, GitError> {
        let output = self
            .git
            .run_raw(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if !output.success() {
            // `symbolic-ref --quiet` exits 1 with no output when detached.
            if output.exit_code == 1 && output.stderr.trim().is_empty() {
                return Err(GitError::DetachedHead);
            }
            return Err(GitError::CommandFailed {
                exit_code: output.exit_code,
                stderr: output.message(),
            });
        }
        let name = output.stdout.trim();
        debug!(branch = name, "resolved current branch");
        BranchName::new(name).map_err(|_| GitError::DetachedHead)
    }

    /// True only when `git status --porcelain` prints nothing.
    pub fn is_clean(&self) -> Result<bool, GitError> {
        let stdout = self.git.run_checked(&["status", "--porcelain"])?;
        Ok(stdout.trim().is_empty())
    }

    /// Paths in unmerged state. Empty means no conflict.
    pub fn conflicted_files(&self) -> Result<Vec<String>, GitError> {
        let stdout = self
            .git
            .run_checked(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(parse_path_list(&stdout))
    }
}
