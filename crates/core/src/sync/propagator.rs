//! Carrying the synchronized branch back into one peer.

use tracing::{info, warn};

use crate::git::client::GitClient;
use crate::models::{BranchName, PropagationResult, PushOutcome};
use crate::report::{ProgressReporter, SyncEvent};

/// Checkout, merge, push, and at most one pull-then-retry for one peer.
pub struct BranchPropagator<'g, 'a> {
    git: &'g GitClient<'a>,
}

impl<'g, 'a> BranchPropagator<'g, 'a> {
    pub fn new(git: &'g GitClient<'a>) -> Self {
        Self { git }
    }

    /// Merge `source` into `target` and push `target`.
    ///
    /// A non-fast-forward rejection triggers exactly one
    /// `pull --no-rebase --no-edit` followed by exactly one retried push.
    /// Nothing loops.
    ///
    /// A merge or pull that stops half-way on the peer is aborted before
    /// returning, so the next checkout is not refused.
    pub fn propagate(
        &self,
        target: &BranchName,
        source: &BranchName,
        reporter: &mut dyn ProgressReporter,
    ) -> PropagationResult {
        info!(target = %target, source = %source, "propagating");
        reporter.on_event(&SyncEvent::PropagationStarted {
            branch: target.clone(),
        });

        // 1. Checkout. On failure we stay wherever git left us.
        if let Err(e) = self.git.checkout(target) {
            let message = e.to_string();
            reporter.on_event(&SyncEvent::CheckoutFailed {
                branch: target.clone(),
                message: message.clone(),
            });
            return PropagationResult::failed(format!("failed to checkout {}: {}", target, message));
        }
        reporter.on_event(&SyncEvent::CheckedOut {
            branch: target.clone(),
        });

        // 2. Merge source into target.
        let merge_error = match self.git.merge(source) {
            Ok(out) if out.success() => None,
            Ok(out) => Some(out.message()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(message) = merge_error {
            reporter.on_event(&SyncEvent::MergeFailed {
                branch: source.clone(),
                message: message.clone(),
            });
            let cleanup = self.abandon_merge(target);
            if let Err(e) = self.git.checkout(source) {
                warn!(source = %source, error = %e, "could not return after failed merge");
            }
            return PropagationResult::failed(format!(
                "failed to merge {} into {}: {}{}",
                source, target, message, cleanup
            ));
        }
        reporter.on_event(&SyncEvent::Merged {
            branch: source.clone(),
            into: target.clone(),
        });

        // 3. Push, with one bounded retry.
        let remote = self.git.remote().to_string();
        reporter.on_event(&SyncEvent::RemoteStarted {
            description: format!("Pushing {}...", target),
        });
        let first = self.git.push(target);
        reporter.on_event(&SyncEvent::RemoteFinished);

        match first {
            PushOutcome::Accepted => {
                reporter.on_event(&SyncEvent::Pushed {
                    branch: target.clone(),
                });
                PropagationResult::pushed(format!("pushed {} to {}", target, remote))
            }
            PushOutcome::RejectedNonFastForward => self.pull_and_retry(target, &remote, reporter),
            PushOutcome::OtherFailure(message) => {
                reporter.on_event(&SyncEvent::PushFailed {
                    branch: target.clone(),
                    message: message.clone(),
                });
                PropagationResult::failed(format!("failed to push {}: {}", target, message))
            }
        }
    }

    /// Abort a merge left unfinished on a peer so later checkouts still work.
    /// Returns a note suffix describing what happened to the peer's tree.
    fn abandon_merge(&self, target: &BranchName) -> String {
        if !self.git.merge_in_progress() {
            return String::new();
        }
        match self.git.merge_abort() {
            Ok(()) => {
                info!(target = %target, "aborted unfinished merge on peer");
                format!("; merge aborted, {} keeps its pre-merge state", target)
            }
            Err(e) => {
                warn!(target = %target, error = %e, "could not abort merge on peer");
                format!("; merge could not be aborted and is still in progress: {}", e)
            }
        }
    }

    fn pull_and_retry(
        &self,
        target: &BranchName,
        remote: &str,
        reporter: &mut dyn ProgressReporter,
    ) -> PropagationResult {
        warn!(target = %target, "push rejected as non-fast-forward, pulling once");
        reporter.on_event(&SyncEvent::PushRejectedRetrying {
            branch: target.clone(),
        });

        reporter.on_event(&SyncEvent::RemoteStarted {
            description: format!("Pulling {} from {}...", target, remote),
        });
        let pulled = self.git.pull(target);
        reporter.on_event(&SyncEvent::RemoteFinished);
        if let Err(e) = pulled {
            let message = e.to_string();
            reporter.on_event(&SyncEvent::PushFailed {
                branch: target.clone(),
                message: message.clone(),
            });
            let cleanup = self.abandon_merge(target);
            return PropagationResult::failed(format!(
                "failed to pull {}: {}{}",
                target, message, cleanup
            ));
        }
        reporter.on_event(&SyncEvent::Pulled {
            branch: target.clone(),
        });

        reporter.on_event(&SyncEvent::RemoteStarted {
            description: format!("Retrying push of {}...", target),
        });
        let retry = self.git.push(target);
        reporter.on_event(&SyncEvent::RemoteFinished);

        match retry {
            PushOutcome::Accepted => {
                reporter.on_event(&SyncEvent::Pushed {
                    branch: target.clone(),
                });
                PropagationResult::pushed(format!(
                    "pushed {} to {} after pulling remote changes",
                    target, remote
                ))
            }
            PushOutcome::RejectedNonFastForward => {
                let message = "rejected again as non-fast-forward".to_string();
                reporter.on_event(&SyncEvent::PushFailed {
                    branch: target.clone(),
                    message: message.clone(),
                });
                PropagationResult::failed(format!("failed to push {} after retry: {}", target, message))
            }
            PushOutcome::OtherFailure(message) => {
                reporter.on_event(&SyncEvent::PushFailed {
                    branch: target.clone(),
                    message: message.clone(),
                });
                PropagationResult::failed(format!("failed to push {} after retry: {}", target, message))
            }
        }
    }
}
