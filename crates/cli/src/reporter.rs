//! Terminal rendering of sync progress and the final summary.

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use branchsync_core::models::TerminalReason;
use branchsync_core::report::{ProgressReporter, SyncEvent};
use branchsync_core::SyncSummary;

use crate::style;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Prints one styled line per event, with a spinner while the remote is busy.
///
/// Writes to stderr when stdout is reserved for `--json` output.
pub struct ConsoleReporter {
    term: Term,
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
            spinner: None,
        }
    }

    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
        }
    }

    fn line(&self, text: impl AsRef<str>) {
        // A closed terminal is not worth failing the sync over.
        let _ = self.term.write_line(text.as_ref());
    }

    fn start_spinner(&mut self, message: &str) {
        self.stop_spinner();
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            spinner.set_style(template.tick_strings(TICKS));
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_event(&mut self, event: &SyncEvent) {
        if !matches!(event, SyncEvent::RemoteFinished) {
            self.stop_spinner();
        }
        match event {
            SyncEvent::SessionStarted { current, targets } => {
                let names: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
                self.line(format!(
                    "Current branch: {}",
                    style::branch(current.as_str())
                ));
                self.line(format!("Branches to sync: {}", names.join(", ")));
            }
            SyncEvent::StepStarted { step, title } => {
                self.line("");
                self.line(style::step(step.number(), title));
            }
            SyncEvent::RemoteStarted { description } => self.start_spinner(description),
            SyncEvent::RemoteFinished => self.stop_spinner(),
            SyncEvent::MergeStarted { branch, into } => {
                self.line(style::dim(&format!("  Merging {} into {}...", branch, into)));
            }
            SyncEvent::Merged { branch, into } => {
                self.line(format!("  {}", style::success(&format!("Merged {} into {}", branch, into))));
            }
            SyncEvent::MergeConflict { branch, files } => {
                self.line(format!(
                    "  {}",
                    style::error(&format!("Merge conflict while merging {}", branch))
                ));
                for file in files {
                    self.line(format!("    - {}", file));
                }
            }
            SyncEvent::MergeFailed { branch, message } => {
                self.line(format!(
                    "  {}",
                    style::error(&format!("Failed to merge {}: {}", branch, message))
                ));
            }
            SyncEvent::EditorOpened { count } => {
                self.line(format!(
                    "  {}",
                    style::success(&format!("Opened {} conflicted file(s) in your editor", count))
                ));
            }
            SyncEvent::EditorFailed { message } => {
                self.line(format!(
                    "  {}",
                    style::warn(&format!("Could not open editor: {}", message))
                ));
            }
            SyncEvent::Pushed { branch } => {
                self.line(format!("  {}", style::success(&format!("Pushed {}", branch))));
            }
            SyncEvent::PushFailed { branch, message } => {
                self.line(format!(
                    "  {}",
                    style::error(&format!("Failed to push {}: {}", branch, message))
                ));
            }
            SyncEvent::PushRejectedRetrying { branch } => {
                self.line(format!(
                    "  {}",
                    style::warn(&format!(
                        "Push of {} rejected (remote has newer commits), pulling and retrying...",
                        branch
                    ))
                ));
            }
            SyncEvent::Pulled { branch } => {
                self.line(format!("  {}", style::success(&format!("Pulled {}", branch))));
            }
            SyncEvent::PropagationStarted { branch } => {
                self.line(format!("  Updating {}...", style::branch(branch.as_str())));
            }
            SyncEvent::CheckedOut { .. } => {}
            SyncEvent::CheckoutFailed { branch, message } => {
                self.line(format!(
                    "  {}",
                    style::error(&format!("Failed to checkout {}: {}", branch, message))
                ));
            }
            SyncEvent::PropagationFinished { branch, result } => {
                if !result.success {
                    self.line(format!(
                        "  {}",
                        style::warn(&format!("{} not synchronized: {}", branch, result.note))
                    ));
                }
            }
            SyncEvent::Returned { branch } => {
                self.line(format!("  {}", style::success(&format!("Back on {}", branch))));
            }
            SyncEvent::ReturnFailed { branch, message } => {
                self.line(format!(
                    "  {}",
                    style::error(&format!("Could not return to {}: {}", branch, message))
                ));
            }
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Styled end-of-run report: headline, per-branch table, next steps.
pub fn render_summary(summary: &SyncSummary) -> String {
    let mut out = Vec::new();
    let rule = "=".repeat(55);
    out.push(String::new());
    out.push(rule.clone());
    let headline = match (summary.success, summary.terminal_reason) {
        (true, _) => style::success(summary.headline()),
        (false, None) => style::warn(summary.headline()),
        (false, Some(_)) => style::error(summary.headline()),
    };
    out.push(headline);
    out.push(rule);

    if let Some(detail) = &summary.failure_detail {
        out.push(format!("Reason: {}", detail));
    }
    if summary.current_pushed {
        out.push(style::success(&format!(
            "Pushed {} to {}",
            summary.current_branch, summary.remote
        )));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Branch", "Merged", "Pushed", "Note"]);
    for row in &summary.branches {
        let pushed = if row.pushed {
            Cell::new("✓ pushed").fg(Color::Green)
        } else if row.failed {
            Cell::new("✗ failed").fg(Color::Red)
        } else {
            Cell::new("—")
        };
        let merged = if row.merged {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("—")
        };
        table.add_row(vec![
            Cell::new(row.branch.as_str()),
            merged,
            pushed,
            Cell::new(row.note.as_deref().unwrap_or("")),
        ]);
    }
    out.push(table.to_string());

    if summary.terminal_reason == Some(TerminalReason::Conflict) {
        out.push(String::new());
        out.push(style::header("Conflicted files:"));
        for file in &summary.conflicted_files {
            out.push(format!("  - {}", file));
        }
    }

    out.push(String::new());
    out.push(format!("Synchronized: {}", list_or_none(&summary.synchronized)));
    out.push(format!(
        "Not synchronized: {}",
        list_or_none(&summary.not_synchronized)
    ));

    if !summary.remediation.is_empty() {
        out.push(String::new());
        out.push(style::header("Next steps:"));
        for line in &summary.remediation {
            out.push(format!("  {}", line));
        }
    }

    out.push(String::new());
    out.push(style::dim(&format!("Finished in {:.1}s", summary.elapsed_secs)));
    out.join("\n")
}

fn list_or_none<T: AsRef<str>>(items: &[T]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items
            .iter()
            .map(|i| i.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchsync_core::models::{BranchName, PropagationResult};
    use branchsync_core::SyncSession;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn test_summary_lists_every_target() {
        let mut session = SyncSession::new(b("main"), vec![b("dev-a"), b("dev-b")]);
        session.record_merged(&b("dev-a"));
        session.record_merged(&b("dev-b"));
        session.current_pushed = true;
        session.record_propagation(&b("dev-a"), PropagationResult::pushed("pushed dev-a"));
        session.record_propagation(&b("dev-b"), PropagationResult::failed("push rejected"));

        let summary = SyncSummary::from_session(&session, "origin");
        let text = render_summary(&summary);
        assert!(text.contains("dev-a"));
        assert!(text.contains("dev-b"));
        assert!(text.contains("push rejected"));
        assert!(text.contains("Next steps:"));
    }

    #[test]
    fn test_conflict_summary_lists_files() {
        let mut session = SyncSession::new(b("main"), vec![b("dev-a")]);
        session.conflicted_files = vec!["lib/x.dart".into()];
        session.halted_at = Some(b("dev-a"));
        session.abort(TerminalReason::Conflict, "merge conflict in 1 file(s)");

        let text = render_summary(&SyncSummary::from_session(&session, "origin"));
        assert!(text.contains("Conflicted files:"));
        assert!(text.contains("lib/x.dart"));
        assert!(text.contains("git merge --abort"));
    }

    #[test]
    fn test_list_or_none() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(list_or_none(&empty), "none");
        assert_eq!(list_or_none(&[b("a"), b("b")]), "a, b");
    }
}
