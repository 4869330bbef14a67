//! The multi-branch sync state machine.
//!
//! `Start → Fetch → MergeForward → PushCurrent → Propagate → Finalize → Done`
//!
//! Any failure in Fetch, MergeForward or PushCurrent moves to `Aborted`.
//! Propagation failures are recorded per peer and never stop the run.
//! Exactly one git command is in flight at a time.

use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use super::propagator::BranchPropagator;
use super::session::SyncSession;
use crate::config::SyncConfig;
use crate::conflict::editor::Editor;
use crate::conflict::handler::MergeConflictHandler;
use crate::errors::SyncError;
use crate::git::client::GitClient;
use crate::git::inspector::RepositoryInspector;
use crate::git::runner::CommandRunner;
use crate::models::{BranchName, MergeOutcome, PushOutcome, TerminalReason};
use crate::prompt::Confirmer;
use crate::report::{ProgressReporter, SyncEvent, SyncStep};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Start,
    Fetch,
    MergeForward,
    PushCurrent,
    Propagate,
    Finalize,
    Done,
    Aborted,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Fetch => write!(f, "fetch"),
            Self::MergeForward => write!(f, "merge_forward"),
            Self::PushCurrent => write!(f, "push_current"),
            Self::Propagate => write!(f, "propagate"),
            Self::Finalize => write!(f, "finalize"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SyncOrchestrator<'a> {
    git: GitClient<'a>,
    editor: &'a dyn Editor,
    confirmer: &'a dyn Confirmer,
    confirm: bool,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &SyncConfig,
        editor: &'a dyn Editor,
        confirmer: &'a dyn Confirmer,
    ) -> Self {
        Self {
            git: GitClient::new(runner, &config.git),
            editor,
            confirmer,
            confirm: config.sync.confirm,
        }
    }

    /// Override the configured confirmation setting.
    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn remote(&self) -> &str {
        self.git.remote()
    }

    /// Run one full sync of the current branch with `targets`.
    ///
    /// Precondition failures return `Err` before any branch is touched.
    /// Everything after that, including conflicts and failed pushes, is
    /// reported through the returned session.
    pub fn run(
        &self,
        targets: &[BranchName],
        reporter: &mut dyn ProgressReporter,
    ) -> Result<SyncSession, SyncError> {
        let mut session = self.start(targets)?;
        reporter.on_event(&SyncEvent::SessionStarted {
            current: session.current_branch.clone(),
            targets: session.targets.clone(),
        });

        let mut state = SyncState::Start;
        loop {
            info!(%state, "sync state");
            state = match state {
                // Preconditions were checked above.
                SyncState::Start => SyncState::Fetch,
                SyncState::Fetch => self.fetch(&mut session, reporter),
                SyncState::MergeForward => self.merge_forward(&mut session, reporter),
                SyncState::PushCurrent => self.push_current(&mut session, reporter),
                SyncState::Propagate => self.propagate(&mut session, reporter),
                SyncState::Finalize => self.finalize(&mut session, reporter),
                SyncState::Done | SyncState::Aborted => break,
            };
        }

        session.finished_at = Some(Utc::now());
        info!(
            success = session.is_success(),
            reason = ?session.terminal_reason,
            "sync finished"
        );
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // START
    // -----------------------------------------------------------------------

    fn start(&self, targets: &[BranchName]) -> Result<SyncSession, SyncError> {
        if targets.is_empty() {
            return Err(SyncError::NoTargets);
        }

        let inspector = RepositoryInspector::new(&self.git);
        if !inspector.is_repository() {
            return Err(SyncError::NotARepository);
        }
        let current = inspector
            .current_branch()
            .map_err(SyncError::UnresolvableBranch)?;
        if !inspector.is_clean().map_err(SyncError::StatusUnavailable)? {
            return Err(SyncError::DirtyWorkingTree);
        }

        if self.confirm {
            let names: Vec<&str> = targets.iter().map(BranchName::as_str).collect();
            let prompt = format!(
                "Merge {} into {}, push, and push {} back to {}?",
                names.join(", "),
                current,
                current,
                self.git.remote()
            );
            if !self.confirmer.confirm(&prompt) {
                return Err(SyncError::Cancelled);
            }
        }

        info!(current = %current, targets = targets.len(), "sync session started");
        Ok(SyncSession::new(current, targets.to_vec()))
    }

    // -----------------------------------------------------------------------
    // FETCH
    // -----------------------------------------------------------------------

    fn fetch(&self, session: &mut SyncSession, reporter: &mut dyn ProgressReporter) -> SyncState {
        self.step(SyncStep::Fetch, session, reporter);
        reporter.on_event(&SyncEvent::RemoteStarted {
            description: "Fetching from remote...".to_string(),
        });
        let result = self.git.fetch();
        reporter.on_event(&SyncEvent::RemoteFinished);

        match result {
            Ok(()) => SyncState::MergeForward,
            Err(e) => {
                warn!(error = %e, "fetch failed");
                session.abort(TerminalReason::FetchFailure, e.to_string());
                SyncState::Aborted
            }
        }
    }

    // -----------------------------------------------------------------------
    // MERGE_FORWARD
    // -----------------------------------------------------------------------

    fn merge_forward(
        &self,
        session: &mut SyncSession,
        reporter: &mut dyn ProgressReporter,
    ) -> SyncState {
        self.step(SyncStep::MergeForward, session, reporter);
        let handler = MergeConflictHandler::new(&self.git, self.editor);
        let current = session.current_branch.clone();

        for target in session.targets.clone() {
            reporter.on_event(&SyncEvent::MergeStarted {
                branch: target.clone(),
                into: current.clone(),
            });
            let attempt = self.git.merge(&target);
            if matches!(&attempt, Ok(out) if out.success()) {
                session.record_merged(&target);
                reporter.on_event(&SyncEvent::Merged {
                    branch: target,
                    into: current.clone(),
                });
                continue;
            }

            // Earlier merges stay applied; nothing further is merged or pushed.
            session.halted_at = Some(target.clone());
            match handler.classify(&target, attempt, reporter) {
                MergeOutcome::ConflictedFiles(files) => {
                    let detail = format!("merge conflict in {} file(s)", files.len());
                    session.conflicted_files = files;
                    session.abort(TerminalReason::Conflict, detail);
                }
                MergeOutcome::OtherFailure(message) => {
                    session.abort(TerminalReason::MergeFailure, message);
                }
                MergeOutcome::Clean => {
                    // A failed attempt never classifies clean; treat it as
                    // a failure rather than guess.
                    session.abort(TerminalReason::MergeFailure, "merge reported no result");
                }
            }
            return SyncState::Aborted;
        }
        SyncState::PushCurrent
    }

    // -----------------------------------------------------------------------
    // PUSH_CURRENT
    // -----------------------------------------------------------------------

    fn push_current(
        &self,
        session: &mut SyncSession,
        reporter: &mut dyn ProgressReporter,
    ) -> SyncState {
        self.step(SyncStep::PushCurrent, session, reporter);
        let current = session.current_branch.clone();
        reporter.on_event(&SyncEvent::RemoteStarted {
            description: format!("Pushing {}...", current),
        });
        let outcome = self.git.push(&current);
        reporter.on_event(&SyncEvent::RemoteFinished);

        let message = match outcome {
            PushOutcome::Accepted => {
                session.current_pushed = true;
                reporter.on_event(&SyncEvent::Pushed { branch: current });
                return SyncState::Propagate;
            }
            PushOutcome::RejectedNonFastForward => {
                "rejected as non-fast-forward; the remote has newer commits".to_string()
            }
            PushOutcome::OtherFailure(message) => message,
        };
        reporter.on_event(&SyncEvent::PushFailed {
            branch: current,
            message: message.clone(),
        });
        session.abort(TerminalReason::PushFailure, message);
        SyncState::Aborted
    }

    // -----------------------------------------------------------------------
    // PROPAGATE
    // -----------------------------------------------------------------------

    fn propagate(
        &self,
        session: &mut SyncSession,
        reporter: &mut dyn ProgressReporter,
    ) -> SyncState {
        self.step(SyncStep::Propagate, session, reporter);
        let propagator = BranchPropagator::new(&self.git);
        let current = session.current_branch.clone();

        for target in session.targets.clone() {
            if !session.is_merged(&target) {
                continue;
            }
            let result = propagator.propagate(&target, &current, reporter);
            reporter.on_event(&SyncEvent::PropagationFinished {
                branch: target.clone(),
                result: result.clone(),
            });
            session.record_propagation(&target, result);
        }
        SyncState::Finalize
    }

    // -----------------------------------------------------------------------
    // FINALIZE
    // -----------------------------------------------------------------------

    fn finalize(&self, session: &mut SyncSession, reporter: &mut dyn ProgressReporter) -> SyncState {
        self.step(SyncStep::Finalize, session, reporter);
        let current = session.current_branch.clone();
        match self.git.checkout(&current) {
            Ok(()) => reporter.on_event(&SyncEvent::Returned { branch: current }),
            Err(e) => {
                warn!(error = %e, "could not return to current branch");
                let message = e.to_string();
                reporter.on_event(&SyncEvent::ReturnFailed {
                    branch: current,
                    message: message.clone(),
                });
                session.return_failure = Some(message);
            }
        }
        SyncState::Done
    }

    fn step(&self, step: SyncStep, session: &SyncSession, reporter: &mut dyn ProgressReporter) {
        reporter.on_event(&SyncEvent::StepStarted {
            step,
            title: step.title(&session.current_branch, self.git.remote()),
        });
    }
}
