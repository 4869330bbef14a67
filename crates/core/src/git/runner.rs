//! Blocking external-command execution.
//!
//! [`CommandRunner`] is the single seam through which the engine touches the
//! outside world. Arguments are passed straight to the child process with no
//! shell interpretation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::errors::GitError;

/// Captured result of one finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The most useful diagnostic text: stderr, or stdout when stderr is empty.
    ///
    /// Merges and pulls print their `CONFLICT` lines on stdout while stderr
    /// holds only progress, so those lines are appended to stderr.
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            return self.stdout.trim().to_string();
        }
        let conflicts: Vec<&str> = self
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("CONFLICT"))
            .collect();
        if conflicts.is_empty() {
            stderr.to_string()
        } else {
            format!("{}\n{}", stderr, conflicts.join("\n"))
        }
    }
}

/// Runs one external command to completion and captures its output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, GitError>;

    /// Like [`run`](Self::run) with extra environment variables for the child.
    /// Runners that never spawn a process may ignore `env`.
    fn run_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, GitError> {
        let _ = env;
        self.run(program, args)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cwd: Option<PathBuf>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command inside `dir` instead of the process working directory.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            cwd: Some(dir.as_ref().to_path_buf()),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.run_env(program, args, &[])
    }

    fn run_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, GitError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(env.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        debug!(cmd = %format!("{} {}", program, args.join(" ")), "running command");
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::BinaryNotFound(program.to_string())
            } else {
                GitError::IoError(e)
            }
        })?;

        // Killed by a signal: no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        let result = CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        if !result.success() {
            warn!(program, exit_code, stderr = %result.stderr.trim(), "command failed");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_stderr() {
        let out = CommandOutput {
            exit_code: 1,
            stdout: "Auto-merging a.txt\n".into(),
            stderr: "  error: boom \n".into(),
        };
        assert_eq!(out.message(), "error: boom");

        let out = CommandOutput {
            exit_code: 1,
            stdout: "Automatic merge failed\n".into(),
            stderr: String::new(),
        };
        assert_eq!(out.message(), "Automatic merge failed");
    }

    #[test]
    fn test_message_keeps_conflicts_from_stdout() {
        let out = CommandOutput {
            exit_code: 1,
            stdout: "Auto-merging a.txt\n\
                     CONFLICT (content): Merge conflict in a.txt\n\
                     Automatic merge failed; fix conflicts and then commit the result.\n"
                .into(),
            stderr: "From /srv/git/origin\n * branch            dev-a      -> FETCH_HEAD\n".into(),
        };
        let message = out.message();
        assert!(message.starts_with("From /srv/git/origin"));
        assert!(message.ends_with("CONFLICT (content): Merge conflict in a.txt"));
        assert!(!message.contains("Auto-merging"));
    }

    #[test]
    fn test_missing_binary() {
        let runner = SystemRunner::new();
        let err = runner
            .run("branchsync-definitely-not-a-binary", &["--version"])
            .unwrap_err();
        assert!(matches!(err, GitError::BinaryNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_exit_code_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::in_dir(dir.path());
        let out = runner
            .run("sh", &["-c", "echo out; echo err 1>&2; exit 3"])
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_env_reaches_child() {
        let runner = SystemRunner::new();
        let out = runner
            .run_env("sh", &["-c", "printf %s \"$LC_ALL\""], &[("LC_ALL", "C")])
            .unwrap();
        assert_eq!(out.stdout, "C");
    }
}
