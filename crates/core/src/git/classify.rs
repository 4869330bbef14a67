//! Mapping raw command output onto structured outcomes.
//!
//! All matching against git's human-readable text lives here, so the rest
//! of the engine only ever sees [`MergeOutcome`] and [`PushOutcome`].

use crate::errors::GitError;
use crate::git::runner::CommandOutput;
use crate::models::{MergeOutcome, PushOutcome};

/// Markers git prints on stderr when the remote refuses a push because the
/// remote branch has moved ahead. `[remote rejected]` (hooks, protected
/// branches) is not listed: a pull cannot resolve it.
const NON_FAST_FORWARD_MARKERS: &[&str] = &[
    "non-fast-forward",
    "fetch first",
    "[rejected]",
    "Updates were rejected because the tip",
    "Updates were rejected because the remote contains work",
];

/// Classify the result of `git push`.
pub fn classify_push(output: &CommandOutput) -> PushOutcome {
    if output.success() {
        return PushOutcome::Accepted;
    }
    if NON_FAST_FORWARD_MARKERS
        .iter()
        .any(|m| output.stderr.contains(m))
    {
        return PushOutcome::RejectedNonFastForward;
    }
    PushOutcome::OtherFailure(output.message())
}

/// Classify a push whose command may not even have started.
pub fn classify_push_result(result: Result<CommandOutput, GitError>) -> PushOutcome {
    match result {
        Ok(output) => classify_push(&output),
        Err(e) => PushOutcome::OtherFailure(e.to_string()),
    }
}

/// Classify a finished merge given the unmerged paths read afterwards.
pub fn classify_merge(output: &CommandOutput, conflicted: &[String]) -> MergeOutcome {
    if output.success() {
        return MergeOutcome::Clean;
    }
    if !conflicted.is_empty() {
        return MergeOutcome::ConflictedFiles(conflicted.to_vec());
    }
    MergeOutcome::OtherFailure(output.message())
}

/// Split newline-separated path output, dropping blanks.
pub fn parse_path_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fail, ok};

    #[test]
    fn test_push_accepted() {
        assert_eq!(classify_push(&ok("")), PushOutcome::Accepted);
    }

    #[test]
    fn test_push_rejected_fetch_first() {
        let out = fail(
            1,
            "To github.com:acme/app.git\n ! [rejected]        dev-a -> dev-a (fetch first)\n\
             error: failed to push some refs to 'github.com:acme/app.git'\n",
        );
        assert_eq!(classify_push(&out), PushOutcome::RejectedNonFastForward);
    }

    #[test]
    fn test_push_rejected_non_fast_forward() {
        let out = fail(
            1,
            " ! [rejected]        main -> main (non-fast-forward)\n\
             hint: Updates were rejected because the tip of your current branch is behind\n",
        );
        assert_eq!(classify_push(&out), PushOutcome::RejectedNonFastForward);
    }

    #[test]
    fn test_push_remote_rejected_is_other_failure() {
        let out = fail(
            1,
            " ! [remote rejected] main -> main (protected branch hook declined)\n",
        );
        assert!(matches!(classify_push(&out), PushOutcome::OtherFailure(msg) if msg.contains("protected")));
    }

    #[test]
    fn test_push_auth_failure() {
        let out = fail(128, "fatal: Authentication failed for 'https://example.com/'\n");
        assert!(matches!(classify_push(&out), PushOutcome::OtherFailure(_)));
    }

    #[test]
    fn test_push_spawn_error() {
        let outcome = classify_push_result(Err(GitError::BinaryNotFound("git".into())));
        assert!(matches!(outcome, PushOutcome::OtherFailure(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_merge_clean_ignores_paths() {
        assert_eq!(classify_merge(&ok("Fast-forward"), &[]), MergeOutcome::Clean);
    }

    #[test]
    fn test_merge_conflict() {
        let out = CommandOutput {
            exit_code: 1,
            stdout: "CONFLICT (content): Merge conflict in lib/x.dart\n".into(),
            stderr: String::new(),
        };
        let outcome = classify_merge(&out, &["lib/x.dart".to_string()]);
        assert_eq!(
            outcome,
            MergeOutcome::ConflictedFiles(vec!["lib/x.dart".into()])
        );
    }

    #[test]
    fn test_merge_other_failure_uses_stderr() {
        let out = fail(1, "merge: dev-z - not something we can merge\n");
        assert_eq!(
            classify_merge(&out, &[]),
            MergeOutcome::OtherFailure("merge: dev-z - not something we can merge".into())
        );
    }

    #[test]
    fn test_parse_path_list() {
        assert_eq!(
            parse_path_list("lib/x.dart\n\n  lib/y.dart  \n"),
            vec!["lib/x.dart".to_string(), "lib/y.dart".to_string()]
        );
        assert!(parse_path_list("").is_empty());
    }
}
