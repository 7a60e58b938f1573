//! GitHub access through the `gh` CLI
//!
//! Command lines are built by pure functions so tests can assert on them; the
//! `GhClient` runs them and decodes the JSON `gh` prints.

use crate::core::error::{DistError, DistResult, ResultExt};
use crate::core::process::{CommandRunner, CommandSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Workflow run status as reported by `gh`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Completed,
  InProgress,
  Queued,
  Requested,
  Waiting,
  Pending,
  #[serde(other)]
  Unknown,
}

impl RunStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      RunStatus::Completed => "completed",
      RunStatus::InProgress => "in_progress",
      RunStatus::Queued => "queued",
      RunStatus::Requested => "requested",
      RunStatus::Waiting => "waiting",
      RunStatus::Pending => "pending",
      RunStatus::Unknown => "unknown",
    }
  }
}

/// Status and conclusion of a run (`gh run view --json status,conclusion`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunState {
  pub status: RunStatus,
  #[serde(default)]
  conclusion: Option<String>,
}

impl RunState {
  pub fn is_completed(&self) -> bool {
    self.status == RunStatus::Completed
  }

  /// Conclusion, with `gh`'s empty string for unfinished runs treated as absent
  pub fn conclusion(&self) -> Option<&str> {
    self.conclusion.as_deref().filter(|c| !c.is_empty())
  }
}

/// One entry of `gh run list --json databaseId,status,conclusion`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
  pub database_id: u64,
  #[serde(flatten)]
  pub state: RunState,
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
  artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
  name: String,
}

/// A release to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
  pub tag: String,
  pub title: String,
  pub target: String,
  pub notes: String,
  pub draft: bool,
  pub assets: Vec<PathBuf>,
}

impl ReleaseSpec {
  /// The release for an ICU version built from `commit`
  pub fn for_version(version: &str, commit: &str, assets: Vec<PathBuf>) -> Self {
    Self {
      tag: format!("v{}", version),
      title: format!("ICU4C {}", version),
      target: commit.to_string(),
      notes: format!("ICU4C version {} builds for multiple platforms", version),
      draft: false,
      assets,
    }
  }

  pub fn command(&self) -> CommandSpec {
    let mut cmd = CommandSpec::new("gh")
      .args(["release", "create", self.tag.as_str()])
      .args(["--title", self.title.as_str()])
      .args(["--target", self.target.as_str()])
      .args(["--notes", self.notes.as_str()]);
    if self.draft {
      cmd = cmd.arg("--draft");
    }
    self.assets.iter().fold(cmd, |cmd, asset| cmd.path_arg(asset))
  }
}

pub fn run_list_command(commit: &str, workflow: &str) -> CommandSpec {
  CommandSpec::new("gh")
    .args(["run", "list", "--commit", commit, "--workflow", workflow])
    .args(["--json", "databaseId,status,conclusion"])
}

pub fn run_view_command(run_id: u64) -> CommandSpec {
  CommandSpec::new("gh")
    .args(["run", "view"])
    .arg(run_id.to_string())
    .args(["--json", "status,conclusion"])
}

pub fn artifacts_command(run_id: u64) -> CommandSpec {
  CommandSpec::new("gh")
    .arg("api")
    .arg(format!("repos/{{owner}}/{{repo}}/actions/runs/{}/artifacts?per_page=100", run_id))
}

pub fn download_command(run_id: u64, name: &str, dir: &Path) -> CommandSpec {
  CommandSpec::new("gh")
    .args(["run", "download"])
    .arg(run_id.to_string())
    .args(["--name", name, "--dir"])
    .path_arg(dir)
}

/// Runs `gh` commands through a `CommandRunner`
#[derive(Clone, Copy)]
pub struct GhClient<'a> {
  runner: &'a dyn CommandRunner,
}

impl<'a> GhClient<'a> {
  pub fn new(runner: &'a dyn CommandRunner) -> Self {
    Self { runner }
  }

  fn json<T: for<'de> Deserialize<'de>>(&self, cmd: &CommandSpec) -> DistResult<T> {
    let stdout = self.runner.output(cmd)?;
    serde_json::from_str(&stdout).with_context(|| format!("Unexpected output from `{}`", cmd))
  }

  /// Runs for a commit in a workflow, newest first
  pub fn list_runs(&self, commit: &str, workflow: &str) -> DistResult<Vec<WorkflowRun>> {
    self.json(&run_list_command(commit, workflow))
  }

  pub fn view_run(&self, run_id: u64) -> DistResult<RunState> {
    self.json(&run_view_command(run_id))
  }

  pub fn artifact_names(&self, run_id: u64) -> DistResult<Vec<String>> {
    let list: ArtifactList = self.json(&artifacts_command(run_id))?;
    Ok(list.artifacts.into_iter().map(|a| a.name).collect())
  }

  /// Download one artifact into `dir` (gh unpacks the artifact zip itself)
  pub fn download_artifact(&self, run_id: u64, name: &str, dir: &Path) -> DistResult<()> {
    self.runner.output(&download_command(run_id, name, dir)).map(|_| ())
  }

  pub fn create_release(&self, release: &ReleaseSpec) -> DistResult<()> {
    if release.assets.is_empty() {
      return Err(DistError::message("Refusing to create a release without assets"));
    }
    self.runner.run(&release.command())
  }
}
