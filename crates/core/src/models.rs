//! Shared data models for the sync engine.
//!
//! These types describe branch identities and the structured outcome of each
//! version-control step. Outcomes are returned as values, never raised, so
//! the orchestrator can match on them exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;

// ---------------------------------------------------------------------------
// BranchName
// ---------------------------------------------------------------------------

/// An opaque, non-empty branch name. Equality is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Wrap `name`, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, SyncError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SyncError::EmptyBranchName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// Step outcomes
// ---------------------------------------------------------------------------

/// Result of merging one branch into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum MergeOutcome {
    Clean,
    /// The merge stopped with unmerged paths.
    ConflictedFiles(Vec<String>),
    OtherFailure(String),
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Result of pushing a branch to its remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum PushOutcome {
    Accepted,
    /// The remote has commits the local branch does not.
    RejectedNonFastForward,
    OtherFailure(String),
}

/// Result of propagating the synchronized branch into one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationResult {
    pub success: bool,
    pub pushed: bool,
    /// Human-readable explanation of what happened.
    pub note: String,
}

impl PropagationResult {
    pub fn pushed(note: impl Into<String>) -> Self {
        Self {
            success: true,
            pushed: true,
            note: note.into(),
        }
    }

    pub fn failed(note: impl Into<String>) -> Self {
        Self {
            success: false,
            pushed: false,
            note: note.into(),
        }
    }
}

/// Why a session stopped before reaching FINALIZE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    Conflict,
    MergeFailure,
    FetchFailure,
    PushFailure,
}

impl TerminalReason {
    /// Conflict and merge failures freeze the repository in place.
    pub fn halts_in_place(&self) -> bool {
        matches!(self, Self::Conflict | Self::MergeFailure)
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::MergeFailure => write!(f, "merge_failure"),
            Self::FetchFailure => write!(f, "fetch_failure"),
            Self::PushFailure => write!(f, "push_failure"),
        }
    }
}
