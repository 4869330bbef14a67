//! Scripted command runner for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::errors::GitError;
use crate::git::runner::{CommandOutput, CommandRunner};

pub(crate) fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

pub(crate) fn fail(exit_code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

struct Rule {
    prefix: String,
    replies: VecDeque<Result<CommandOutput, ()>>,
}

/// Answers commands by matching the joined command line against prefixes.
///
/// The first matching rule wins. Each rule replays its replies in order and
/// repeats the last one forever. Unmatched commands succeed with no output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, prefix: &str, reply: CommandOutput) -> Self {
        self.push_reply(prefix, Ok(reply));
        self
    }

    /// Simulate a spawn failure (binary missing).
    pub(crate) fn on_spawn_error(self, prefix: &str) -> Self {
        self.push_reply(prefix, Err(()));
        self
    }

    fn push_reply(&self, prefix: &str, reply: Result<CommandOutput, ()>) {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, GitError> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line.clone());

        let mut rules = self.rules.borrow_mut();
        let Some(rule) = rules.iter_mut().find(|r| line.starts_with(&r.prefix)) else {
            return Ok(CommandOutput::default());
        };
        let reply = if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().cloned()
        };
        match reply {
            Some(Ok(out)) => Ok(out),
            Some(Err(())) => Err(GitError::BinaryNotFound(program.to_string())),
            None => Ok(CommandOutput::default()),
        }
    }
}
