//! Error types for the branchsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.
//!
//! Stage outcomes of a sync (a merge conflict, a rejected push) are *not*
//! errors; they are plain values in [`crate::models`]. Only failures that
//! stop a session before it starts surface through [`SyncError`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from running the version-control binary.
#[derive(Debug, Error)]
pub enum GitError {
    /// The binary was not found on `$PATH`.
    #[error("binary not found: {0}")]
    BinaryNotFound(String),

    /// A command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch before syncing")]
    DetachedHead,

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Precondition failures that prevent a sync session from starting.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The working directory is not a repository.
    #[error("not a git repository or git not available")]
    NotARepository,

    /// The current branch could not be resolved.
    #[error("could not resolve current branch: {0}")]
    UnresolvableBranch(#[source] GitError),

    /// The working tree has uncommitted changes.
    #[error("you have uncommitted changes; commit or stash them first")]
    DirtyWorkingTree,

    /// The tree status could not be read.
    #[error("could not read working tree status: {0}")]
    StatusUnavailable(#[source] GitError),

    /// No target branches were given.
    #[error("at least one target branch is required")]
    NoTargets,

    /// A branch name was empty.
    #[error("branch names must not be empty")]
    EmptyBranchName,

    /// The user declined the confirmation prompt.
    #[error("sync cancelled by user")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Editor errors
// ---------------------------------------------------------------------------

/// Errors from launching the external editor on conflicted files.
#[derive(Debug, Error)]
pub enum EditorError {
    /// No editor command is configured.
    #[error("no editor configured")]
    Disabled,

    /// The editor could not be started.
    #[error("failed to launch editor '{command}': {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: GitError,
    },

    /// The editor started but exited with a failure status.
    #[error("editor '{command}' exited with status {exit_code}")]
    Exited { command: String, exit_code: i32 },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
