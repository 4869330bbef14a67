//! Progress events and end-of-run summaries.
//!
//! The engine narrates what it is doing through [`SyncEvent`]s delivered to a
//! [`ProgressReporter`]; rendering is the reporter's business. After a run,
//! [`SyncSummary`] turns a finished [`SyncSession`] into the facts a user
//! needs: what is synchronized, what is not, and what to type next.

use serde::Serialize;

use crate::models::{BranchName, PropagationResult, TerminalReason};
use crate::sync::session::SyncSession;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Numbered stages shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Fetch,
    MergeForward,
    PushCurrent,
    Propagate,
    Finalize,
}

impl SyncStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::Fetch => 1,
            Self::MergeForward => 2,
            Self::PushCurrent => 3,
            Self::Propagate => 4,
            Self::Finalize => 5,
        }
    }

    pub fn title(&self, current: &BranchName, remote: &str) -> String {
        match self {
            Self::Fetch => "Fetching latest changes...".to_string(),
            Self::MergeForward => format!("Merging branches into {}...", current),
            Self::PushCurrent => format!("Pushing {} to {}...", current, remote),
            Self::Propagate => "Pushing merged changes to source branches...".to_string(),
            Self::Finalize => format!("Returning to {}...", current),
        }
    }
}

/// Something the engine did or is about to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    SessionStarted {
        current: BranchName,
        targets: Vec<BranchName>,
    },
    StepStarted {
        step: SyncStep,
        title: String,
    },
    /// A network operation began; may take a while.
    RemoteStarted { description: String },
    RemoteFinished,
    MergeStarted { branch: BranchName, into: BranchName },
    Merged { branch: BranchName, into: BranchName },
    MergeConflict { branch: BranchName, files: Vec<String> },
    MergeFailed { branch: BranchName, message: String },
    EditorOpened { count: usize },
    EditorFailed { message: String },
    Pushed { branch: BranchName },
    PushFailed { branch: BranchName, message: String },
    PushRejectedRetrying { branch: BranchName },
    Pulled { branch: BranchName },
    PropagationStarted { branch: BranchName },
    CheckedOut { branch: BranchName },
    CheckoutFailed { branch: BranchName, message: String },
    PropagationFinished {
        branch: BranchName,
        result: PropagationResult,
    },
    Returned { branch: BranchName },
    ReturnFailed { branch: BranchName, message: String },
}

/// Receives [`SyncEvent`]s as they happen.
pub trait ProgressReporter {
    fn on_event(&mut self, event: &SyncEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn on_event(&mut self, _event: &SyncEvent) {}
}

/// Keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<SyncEvent>,
}

impl ProgressReporter for RecordingReporter {
    fn on_event(&mut self, event: &SyncEvent) {
        self.events.push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-target line of the final report.
#[derive(Debug, Clone, Serialize)]
pub struct BranchReport {
    pub branch: BranchName,
    pub merged: bool,
    pub pushed: bool,
    pub failed: bool,
    pub note: Option<String>,
}

/// Serializable view of a finished session.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub current_branch: BranchName,
    pub remote: String,
    pub success: bool,
    pub terminal_reason: Option<TerminalReason>,
    pub failure_detail: Option<String>,
    pub current_pushed: bool,
    pub merged: Vec<BranchName>,
    pub pushed: Vec<BranchName>,
    pub failed: Vec<BranchName>,
    pub conflicted_files: Vec<String>,
    /// Every branch that now holds the same content as the current branch.
    pub synchronized: Vec<BranchName>,
    pub not_synchronized: Vec<BranchName>,
    pub branches: Vec<BranchReport>,
    pub remediation: Vec<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub elapsed_secs: f64,
}

impl SyncSummary {
    pub fn from_session(session: &SyncSession, remote: &str) -> Self {
        let mut branches: Vec<BranchReport> = Vec::new();
        for target in &session.targets {
            if branches.iter().any(|r| &r.branch == target) {
                continue;
            }
            let note = session
                .propagation
                .iter()
                .rev()
                .find(|(b, _)| b == target)
                .map(|(_, r)| r.note.clone())
                .or_else(|| {
                    (session.halted_at.as_ref() == Some(target))
                        .then(|| session.failure_detail.clone())
                        .flatten()
                });
            branches.push(BranchReport {
                branch: target.clone(),
                merged: session.is_merged(target),
                pushed: session.pushed_peers.contains(target),
                failed: session.failed_peers.contains(target),
                note,
            });
        }

        let mut synchronized = Vec::new();
        if session.current_pushed {
            synchronized.push(session.current_branch.clone());
            synchronized.extend(session.pushed_peers.iter().cloned());
        }
        let mut not_synchronized = session.unsynchronized();
        if !session.current_pushed {
            not_synchronized.insert(0, session.current_branch.clone());
        }

        let elapsed = session.elapsed();
        Self {
            current_branch: session.current_branch.clone(),
            remote: remote.to_string(),
            success: session.is_success(),
            terminal_reason: session.terminal_reason,
            failure_detail: session.failure_detail.clone(),
            current_pushed: session.current_pushed,
            merged: session.merged_into_current.clone(),
            pushed: session.pushed_peers.clone(),
            failed: session.failed_peers.clone(),
            conflicted_files: session.conflicted_files.clone(),
            synchronized,
            not_synchronized,
            branches,
            remediation: remediation(session, remote),
            started_at: session.started_at.to_rfc3339(),
            finished_at: session.finished_at.map(|t| t.to_rfc3339()),
            elapsed_secs: elapsed.num_milliseconds() as f64 / 1000.0,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.terminal_reason {
            Some(TerminalReason::Conflict) => "Sync stopped: merge conflict",
            Some(TerminalReason::MergeFailure) => "Sync stopped: merge failed",
            Some(TerminalReason::FetchFailure) => "Sync stopped: fetch failed",
            Some(TerminalReason::PushFailure) => "Sync stopped: push failed",
            None if self.success => "Sync complete!",
            None => "Sync completed with issues",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering, free of terminal styling.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(55);
        out.push_str(&rule);
        out.push('\n');
        out.push_str(self.headline());
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');

        if let Some(detail) = &self.failure_detail {
            out.push_str(&format!("  Reason: {}\n", detail));
        }
        if !self.merged.is_empty() {
            out.push_str(&format!(
                "  Merged: {} -> {}\n",
                join(&self.merged),
                self.current_branch
            ));
        }
        if self.current_pushed {
            out.push_str(&format!(
                "  Pushed: {} to {}\n",
                self.current_branch, self.remote
            ));
        }
        if !self.pushed.is_empty() {
            out.push_str(&format!("  Updated & pushed: {}\n", join(&self.pushed)));
        }
        if !self.failed.is_empty() {
            out.push_str(&format!("  Failed to push: {}\n", join(&self.failed)));
        }
        if !self.conflicted_files.is_empty() {
            out.push_str(&format!(
                "  Conflicted files: {}\n",
                self.conflicted_files.join(", ")
            ));
        }
        out.push_str(&format!(
            "  Synchronized: {}\n",
            or_none(&self.synchronized)
        ));
        out.push_str(&format!(
            "  Not synchronized: {}\n",
            or_none(&self.not_synchronized)
        ));
        if !self.remediation.is_empty() {
            out.push_str("\nNext steps:\n");
            for line in &self.remediation {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out
    }
}

fn join(branches: &[BranchName]) -> String {
    branches
        .iter()
        .map(BranchName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_none(branches: &[BranchName]) -> String {
    if branches.is_empty() {
        "none".to_string()
    } else {
        join(branches)
    }
}

/// Exact commands that move an unfinished sync forward.
pub fn remediation(session: &SyncSession, remote: &str) -> Vec<String> {
    let current = &session.current_branch;
    let rerun = format!(
        "Re-run the sync: branchsync sync {}",
        session
            .targets
            .iter()
            .map(BranchName::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut steps = Vec::new();
    match session.terminal_reason {
        Some(TerminalReason::Conflict) => {
            let files = if session.conflicted_files.is_empty() {
                "<file>".to_string()
            } else {
                session.conflicted_files.join(" ")
            };
            steps.push(format!("1. Stage the resolved files: git add {}", files));
            steps.push("2. Complete the merge: git commit".to_string());
            steps.push(format!("3. {}", rerun));
            steps.push("Or abort the merge: git merge --abort".to_string());
        }
        Some(TerminalReason::MergeFailure) => {
            steps.push("Inspect the merge error above.".to_string());
            steps.push("If a merge is in progress, abort it: git merge --abort".to_string());
            steps.push(rerun);
        }
        Some(TerminalReason::FetchFailure) => {
            steps.push(format!("Check connectivity to the remote: git fetch {}", remote));
            steps.push(rerun);
        }
        Some(TerminalReason::PushFailure) => {
            steps.push(format!(
                "Bring in the remote's changes: git pull {} {} --no-rebase",
                remote, current
            ));
            steps.push(rerun);
        }
        None => {}
    }

    for peer in &session.failed_peers {
        steps.push(format!(
            "Update {peer} by hand: git checkout {peer} && git merge {current} && git push {remote} {peer} && git checkout {current}"
        ));
    }
    if let Some(message) = &session.return_failure {
        steps.push(format!(
            "Return to {current} once the working tree allows it: git checkout {current} ({message})"
        ));
    }
    steps
}
