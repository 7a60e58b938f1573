//! Subprocess execution
//!
//! Everything this tool does beyond file shuffling is an external command:
//! compilers, `make`, `msbuild`, `docker`, `gh`, `git`. Commands are described
//! as plain data (`CommandSpec`) by the planning code and executed through the
//! `CommandRunner` trait, so the planning code can be tested against a
//! recording runner without spawning anything.

#[cfg(test)]
pub mod fake;

use crate::core::error::{CommandError, DistError, DistResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cwd: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env: Vec<(String, String)>,
  /// Directories prepended to PATH at execution time
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub path_prefix: Vec<PathBuf>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: Vec::new(),
      path_prefix: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Append a path argument (lossy for non-UTF-8 paths)
  pub fn path_arg(self, path: &Path) -> Self {
    self.arg(path.display().to_string())
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  pub fn prepend_path(mut self, dir: impl Into<PathBuf>) -> Self {
    self.path_prefix.push(dir.into());
    self
  }

  /// Program followed by arguments
  pub fn argv(&self) -> Vec<&str> {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect()
  }

  /// Whether argv starts with the given words
  #[cfg(test)]
  pub fn starts_with(&self, prefix: &[&str]) -> bool {
    let argv = self.argv();
    argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, b)| a == b)
  }

  /// Value following `flag` in the argument list
  #[cfg(test)]
  pub fn flag_value(&self, flag: &str) -> Option<&str> {
    self
      .args
      .iter()
      .position(|a| a == flag)
      .and_then(|idx| self.args.get(idx + 1))
      .map(String::as_str)
  }

  fn to_command(&self) -> DistResult<Command> {
    let mut cmd = Command::new(&self.program);
    cmd.args(&self.args);
    if let Some(cwd) = &self.cwd {
      cmd.current_dir(cwd);
    }
    for (key, value) in &self.env {
      cmd.env(key, value);
    }
    if !self.path_prefix.is_empty() {
      let mut dirs: Vec<PathBuf> = self.path_prefix.clone();
      if let Some(existing) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&existing));
      }
      let joined: OsString = std::env::join_paths(dirs)
        .map_err(|e| DistError::message(format!("Cannot build PATH for {}: {}", self.program, e)))?;
      cmd.env("PATH", joined);
    }
    Ok(cmd)
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let words: Vec<String> = self.argv().into_iter().map(quote).collect();
    write!(f, "{}", words.join(" "))
  }
}

fn quote(word: &str) -> String {
  if word.is_empty() {
    "''".to_string()
  } else if word.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
    format!("'{}'", word.replace('\'', r"'\''"))
  } else {
    word.to_string()
  }
}

/// Executes external commands
///
/// Implementations must be shareable across the artifact download workers.
pub trait CommandRunner: Send + Sync {
  /// Run with inherited stdio. A non-zero exit is an error carrying the exit code.
  fn run(&self, cmd: &CommandSpec) -> DistResult<()>;

  /// Run with stdout captured (stderr inherited) and return stdout as text.
  fn output(&self, cmd: &CommandSpec) -> DistResult<String>;
}

/// Runs commands on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
  pub fn new() -> Self {
    Self
  }
}

impl CommandRunner for SystemRunner {
  fn run(&self, cmd: &CommandSpec) -> DistResult<()> {
    tracing::debug!(command = %cmd, cwd = ?cmd.cwd, "spawning");
    let status = cmd.to_command()?.status().map_err(|e| spawn_error(cmd, e))?;

    if !status.success() {
      return Err(DistError::Command(CommandError::Failed {
        command: cmd.to_string(),
        code: status.code(),
      }));
    }
    Ok(())
  }

  fn output(&self, cmd: &CommandSpec) -> DistResult<String> {
    tracing::debug!(command = %cmd, cwd = ?cmd.cwd, "spawning (captured)");
    let output = cmd
      .to_command()?
      .stdin(Stdio::null())
      .stderr(Stdio::inherit())
      .output()
      .map_err(|e| spawn_error(cmd, e))?;

    if !output.status.success() {
      return Err(DistError::Command(CommandError::Failed {
        command: cmd.to_string(),
        code: output.status.code(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

fn spawn_error(cmd: &CommandSpec, err: std::io::Error) -> DistError {
  DistError::Command(CommandError::Spawn {
    program: cmd.program.clone(),
    reason: err.to_string(),
  })
}
