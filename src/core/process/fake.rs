//! Recording command runner (testing only)
//!
//! Replies are matched by argv prefix, first rule wins. Commands with no
//! matching rule succeed with empty output. Every call is recorded so tests can
//! assert on what would have been executed.

use super::{CommandRunner, CommandSpec};
use crate::core::error::{CommandError, DistError, DistResult};
use std::collections::VecDeque;
use std::sync::Mutex;

type Effect = Box<dyn Fn(&CommandSpec) -> DistResult<String> + Send + Sync>;

enum Reply {
  Stdout(String),
  Sequence(Mutex<VecDeque<String>>),
  Fail(i32),
  Effect(Effect),
}

struct Rule {
  prefix: Vec<String>,
  reply: Reply,
}

#[derive(Default)]
pub struct ScriptedRunner {
  rules: Vec<Rule>,
  calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
  pub fn new() -> Self {
    Self::default()
  }

  fn rule(mut self, prefix: &[&str], reply: Reply) -> Self {
    self.rules.push(Rule {
      prefix: prefix.iter().map(|s| s.to_string()).collect(),
      reply,
    });
    self
  }

  /// Reply with fixed stdout
  pub fn on_stdout(self, prefix: &[&str], stdout: impl Into<String>) -> Self {
    self.rule(prefix, Reply::Stdout(stdout.into()))
  }

  /// Reply with successive stdouts; the last one repeats
  pub fn on_sequence(self, prefix: &[&str], outputs: &[&str]) -> Self {
    let queue = outputs.iter().map(|s| s.to_string()).collect();
    self.rule(prefix, Reply::Sequence(Mutex::new(queue)))
  }

  /// Exit with the given status
  pub fn on_fail(self, prefix: &[&str], code: i32) -> Self {
    self.rule(prefix, Reply::Fail(code))
  }

  /// Run a side effect (e.g. create downloaded files) and reply with its result
  pub fn on_effect<F>(self, prefix: &[&str], effect: F) -> Self
  where
    F: Fn(&CommandSpec) -> DistResult<String> + Send + Sync + 'static,
  {
    self.rule(prefix, Reply::Effect(Box::new(effect)))
  }

  /// All recorded calls, in order
  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.lock().map(|c| c.clone()).unwrap_or_default()
  }

  /// Number of recorded calls starting with `prefix`
  pub fn count(&self, prefix: &[&str]) -> usize {
    self.calls().iter().filter(|c| c.starts_with(prefix)).count()
  }

  pub fn invoked(&self, prefix: &[&str]) -> bool {
    self.count(prefix) > 0
  }

  fn respond(&self, cmd: &CommandSpec) -> DistResult<String> {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(cmd.clone());
    }

    let prefixed = |rule: &Rule| {
      let words: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
      cmd.starts_with(&words)
    };

    let Some(rule) = self.rules.iter().find(|r| prefixed(r)) else {
      return Ok(String::new());
    };

    match &rule.reply {
      Reply::Stdout(out) => Ok(out.clone()),
      Reply::Sequence(queue) => {
        let mut queue = queue.lock().map_err(|_| DistError::message("poisoned reply queue"))?;
        let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        Ok(next.unwrap_or_default())
      }
      Reply::Fail(code) => Err(DistError::Command(CommandError::Failed {
        command: cmd.to_string(),
        code: Some(*code),
      })),
      Reply::Effect(effect) => effect(cmd),
    }
  }
}

impl CommandRunner for ScriptedRunner {
  fn run(&self, cmd: &CommandSpec) -> DistResult<()> {
    self.respond(cmd).map(|_| ())
  }

  fn output(&self, cmd: &CommandSpec) -> DistResult<String> {
    self.respond(cmd)
  }
}
