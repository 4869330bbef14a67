//! In-memory record of one sync invocation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{BranchName, PropagationResult, TerminalReason};

/// Everything a sync run learned, mutated in place as stages complete.
///
/// Branch sets keep first-seen order so reports follow the caller's order.
/// Nothing is persisted; the session is dropped after reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSession {
    pub current_branch: BranchName,
    /// Caller-supplied order, duplicates kept.
    pub targets: Vec<BranchName>,
    pub merged_into_current: Vec<BranchName>,
    pub current_pushed: bool,
    pub pushed_peers: Vec<BranchName>,
    pub failed_peers: Vec<BranchName>,
    pub terminal_reason: Option<TerminalReason>,
    /// Target whose forward merge stopped the session.
    pub halted_at: Option<BranchName>,
    pub conflicted_files: Vec<String>,
    /// Diagnostic text for the stage that aborted the session.
    pub failure_detail: Option<String>,
    pub propagation: Vec<(BranchName, PropagationResult)>,
    /// Set when FINALIZE could not check out `current_branch` again.
    pub return_failure: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncSession {
    pub fn new(current_branch: BranchName, targets: Vec<BranchName>) -> Self {
        Self {
            current_branch,
            targets,
            merged_into_current: Vec::new(),
            current_pushed: false,
            pushed_peers: Vec::new(),
            failed_peers: Vec::new(),
            terminal_reason: None,
            halted_at: None,
            conflicted_files: Vec::new(),
            failure_detail: None,
            propagation: Vec::new(),
            return_failure: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_merged(&mut self, branch: &BranchName) {
        insert_unique(&mut self.merged_into_current, branch);
    }

    pub fn record_propagation(&mut self, branch: &BranchName, result: PropagationResult) {
        if result.success && result.pushed {
            insert_unique(&mut self.pushed_peers, branch);
        } else {
            insert_unique(&mut self.failed_peers, branch);
        }
        self.propagation.push((branch.clone(), result));
    }

    pub fn abort(&mut self, reason: TerminalReason, detail: impl Into<String>) {
        self.terminal_reason = Some(reason);
        self.failure_detail = Some(detail.into());
    }

    pub fn is_merged(&self, branch: &BranchName) -> bool {
        self.merged_into_current.contains(branch)
    }

    pub fn is_aborted(&self) -> bool {
        self.terminal_reason.is_some()
    }

    /// No peer failed, no stage aborted the session, and the run ended back
    /// on the current branch.
    pub fn is_success(&self) -> bool {
        self.failed_peers.is_empty()
            && self.terminal_reason.is_none()
            && self.return_failure.is_none()
    }

    /// Targets that never made it into the current branch or out to a peer.
    pub fn unsynchronized(&self) -> Vec<BranchName> {
        let mut out = Vec::new();
        for target in &self.targets {
            if !self.pushed_peers.contains(target) {
                insert_unique(&mut out, target);
            }
        }
        out
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

fn insert_unique(set: &mut Vec<BranchName>, branch: &BranchName) {
    if !set.contains(branch) {
        set.push(branch.clone());
    }
}
