//! End-to-end tests for multi-branch synchronization.
//!
//! These tests exercise the real `SyncOrchestrator` with:
//! - A local working repository driven through `SystemRunner`
//! - A local bare "origin" for fetches and pushes
//! - A second clone standing in for another developer
//!
//! No network I/O: every remote is a path on disk.
//!
//! Tests skip gracefully if `git` is not installed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

use branchsync_core::config::SyncConfig;
use branchsync_core::conflict::CommandEditor;
use branchsync_core::git::SystemRunner;
use branchsync_core::models::TerminalReason;
use branchsync_core::prompt::AssumeYes;
use branchsync_core::report::NullReporter;
use branchsync_core::{BranchName, SyncOrchestrator, SyncSession};

// ===========================================================================
// Helpers
// ===========================================================================

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

fn commit_file(dir: &Path, name: &str, content: &str, message: &str) {
    std::fs::write(dir.join(name), content).unwrap();
    git(dir, &["add", name]);
    git(dir, &["commit", "-m", message]);
}

struct Fixture {
    _tmp: TempDir,
    work: PathBuf,
    origin: PathBuf,
    root: PathBuf,
}

/// `main`, `dev-a` and `dev-b`, each with its own file, all pushed to origin.
/// The working copy is left on `main`.
fn setup() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let origin = root.join("origin.git");
    let work = root.join("work");
    std::fs::create_dir_all(&origin).unwrap();
    std::fs::create_dir_all(&work).unwrap();

    git(&origin, &["init", "--bare", "--quiet"]);
    git(&origin, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&work, &["init", "--quiet"]);
    configure_identity(&work);
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    commit_file(&work, "README.md", "shared\n", "initial commit");
    git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
    git(&work, &["push", "-q", "origin", "main"]);

    for (branch, file) in [("dev-a", "a.txt"), ("dev-b", "b.txt")] {
        git(&work, &["checkout", "-q", "-b", branch, "main"]);
        commit_file(&work, file, &format!("{}\n", branch), &format!("work on {}", branch));
        git(&work, &["push", "-q", "origin", branch]);
    }
    git(&work, &["checkout", "-q", "main"]);

    Fixture {
        _tmp: tmp,
        work,
        origin,
        root,
    }
}

fn branches(names: &[&str]) -> Vec<BranchName> {
    names.iter().map(|n| BranchName::new(*n).unwrap()).collect()
}

fn run_sync(work: &Path, targets: &[&str]) -> SyncSession {
    let mut config = SyncConfig::default();
    config.editor.command = String::new();

    let runner = SystemRunner::in_dir(work);
    let editor = CommandEditor::new(&runner, &config.editor);
    let orchestrator = SyncOrchestrator::new(&runner, &config, &editor, &AssumeYes);
    orchestrator
        .run(&branches(targets), &mut NullReporter)
        .expect("sync should start")
}

fn remote_sha(origin: &Path, branch: &str) -> String {
    git(origin, &["rev-parse", &format!("refs/heads/{}", branch)])
}

// ===========================================================================
// Tests
// ===========================================================================

/// Every branch ends up with the union of all changes, on origin too.
#[test]
fn test_clean_sync_converges_all_branches() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();

    let session = run_sync(&fx.work, &["dev-a", "dev-b"]);
    assert!(session.is_success(), "session: {:?}", session);
    assert!(session.current_pushed);
    assert_eq!(session.pushed_peers, branches(&["dev-a", "dev-b"]));

    let main = remote_sha(&fx.origin, "main");
    assert_eq!(remote_sha(&fx.origin, "dev-a"), main);
    assert_eq!(remote_sha(&fx.origin, "dev-b"), main);

    assert_eq!(git(&fx.work, &["symbolic-ref", "--short", "HEAD"]), "main");
    assert!(fx.work.join("a.txt").exists());
    assert!(fx.work.join("b.txt").exists());
}

/// A second run with nothing new changes nothing and still succeeds.
#[test]
fn test_second_sync_is_a_no_op() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();

    assert!(run_sync(&fx.work, &["dev-a", "dev-b"]).is_success());
    let before = remote_sha(&fx.origin, "main");

    let second = run_sync(&fx.work, &["dev-a", "dev-b"]);
    assert!(second.is_success());
    assert!(second.failed_peers.is_empty());
    assert_eq!(remote_sha(&fx.origin, "main"), before);
    assert_eq!(remote_sha(&fx.origin, "dev-a"), before);
}

/// A conflict halts in place: the merge stays in progress and nothing is pushed.
#[test]
fn test_conflict_leaves_merge_in_progress() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();

    git(&fx.work, &["checkout", "-q", "dev-b"]);
    commit_file(&fx.work, "README.md", "from dev-b\n", "edit readme on dev-b");
    git(&fx.work, &["push", "-q", "origin", "dev-b"]);
    git(&fx.work, &["checkout", "-q", "main"]);
    commit_file(&fx.work, "README.md", "from main\n", "edit readme on main");
    let main_on_origin = remote_sha(&fx.origin, "main");

    let session = run_sync(&fx.work, &["dev-a", "dev-b"]);
    assert_eq!(session.terminal_reason, Some(TerminalReason::Conflict));
    assert_eq!(session.merged_into_current, branches(&["dev-a"]));
    assert_eq!(session.conflicted_files, vec!["README.md".to_string()]);
    assert!(session.pushed_peers.is_empty());

    // Still on main, mid-merge.
    assert_eq!(git(&fx.work, &["symbolic-ref", "--short", "HEAD"]), "main");
    git(&fx.work, &["rev-parse", "-q", "--verify", "MERGE_HEAD"]);
    assert_eq!(remote_sha(&fx.origin, "main"), main_on_origin);
}

/// A peer that moved on origin is pulled once and pushed again.
#[test]
fn test_rejected_peer_push_is_retried_after_pull() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();

    let other = fx.root.join("other");
    Command::new("git")
        .args(["clone", "-q", fx.origin.to_str().unwrap(), other.to_str().unwrap()])
        .status()
        .expect("failed to clone");
    configure_identity(&other);
    git(&other, &["checkout", "-q", "dev-a"]);
    commit_file(&other, "c.txt", "colleague\n", "colleague work on dev-a");
    git(&other, &["push", "-q", "origin", "dev-a"]);

    let session = run_sync(&fx.work, &["dev-a"]);
    assert!(session.is_success(), "session: {:?}", session);
    assert_eq!(session.pushed_peers, branches(&["dev-a"]));

    git(&fx.work, &["fetch", "-q", "origin"]);
    let files = git(&fx.work, &["ls-tree", "--name-only", "origin/dev-a"]);
    assert!(files.contains("a.txt"));
    assert!(files.contains("c.txt"));
    assert_eq!(git(&fx.work, &["symbolic-ref", "--short", "HEAD"]), "main");
}

/// A peer whose pull stops on a conflict is abandoned cleanly: later peers
/// still update and the run ends back on the current branch.
#[test]
fn test_conflicting_pull_does_not_strand_the_run() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();

    let other = fx.root.join("other");
    Command::new("git")
        .args(["clone", "-q", fx.origin.to_str().unwrap(), other.to_str().unwrap()])
        .status()
        .expect("failed to clone");
    configure_identity(&other);
    git(&other, &["checkout", "-q", "dev-a"]);
    commit_file(&other, "a.txt", "colleague\n", "colleague rewrites a.txt");
    git(&other, &["push", "-q", "origin", "dev-a"]);

    git(&fx.work, &["checkout", "-q", "dev-a"]);
    commit_file(&fx.work, "a.txt", "local\n", "local rewrite of a.txt");
    git(&fx.work, &["checkout", "-q", "main"]);

    let session = run_sync(&fx.work, &["dev-a", "dev-b"]);
    assert_eq!(session.failed_peers, branches(&["dev-a"]));
    assert_eq!(session.pushed_peers, branches(&["dev-b"]));
    assert!(session.return_failure.is_none(), "session: {:?}", session);
    assert!(!session.is_success());

    let (_, dev_a) = session
        .propagation
        .iter()
        .find(|(b, _)| b.as_str() == "dev-a")
        .unwrap();
    assert!(dev_a.note.contains("a.txt"), "note: {}", dev_a.note);
    assert!(dev_a.note.contains("merge aborted"), "note: {}", dev_a.note);

    assert_eq!(git(&fx.work, &["symbolic-ref", "--short", "HEAD"]), "main");
    let merge_head = Command::new("git")
        .args(["rev-parse", "-q", "--verify", "MERGE_HEAD"])
        .current_dir(&fx.work)
        .output()
        .unwrap();
    assert!(!merge_head.status.success());
    assert_eq!(remote_sha(&fx.origin, "dev-b"), remote_sha(&fx.origin, "main"));
}

/// Uncommitted work stops the run before any branch is touched.
#[test]
fn test_dirty_tree_is_refused() {
    if !git_available() {
        eprintln!("SKIPPED: git not found in PATH");
        return;
    }
    let fx = setup();
    std::fs::write(fx.work.join("README.md"), "uncommitted\n").unwrap();
    let before = git(&fx.work, &["rev-parse", "HEAD"]);

    let mut config = SyncConfig::default();
    config.editor.command = String::new();
    let runner = SystemRunner::in_dir(&fx.work);
    let editor = CommandEditor::new(&runner, &config.editor);
    let orchestrator = SyncOrchestrator::new(&runner, &config, &editor, &AssumeYes);
    let err = orchestrator
        .run(&branches(&["dev-a"]), &mut NullReporter)
        .unwrap_err();

    assert!(err.to_string().contains("uncommitted changes"));
    assert_eq!(git(&fx.work, &["rev-parse", "HEAD"]), before);
}
