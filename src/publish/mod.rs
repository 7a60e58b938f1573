//! Publishing a GitHub release from the CI run of a commit
//!
//! ```text
//! commit ref → sha → workflow run → (wait) → artifacts → *.tar.gz → release
//! ```
//!
//! Dry run is the default: everything up to listing the archives happens, the
//! release itself is only created with `actually_publish`.

pub mod artifacts;
pub mod github;

use crate::core::config::PublishConfig;
use crate::core::error::{DistError, DistResult, PublishError};
use crate::core::process::{CommandRunner, CommandSpec};
use github::{GhClient, ReleaseSpec, RunState};
use serde::Serialize;
use std::io::Write;
use std::time::{Duration, Instant};

/// What to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
  /// Commit hash, or `@`/`HEAD` for the current checkout
  pub commit: String,
  pub version: String,
  pub actually_publish: bool,
  pub draft: bool,
}

/// Result of a publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
  pub commit: String,
  pub run_id: u64,
  pub tag: String,
  /// Archive file names, sorted
  pub archives: Vec<String>,
  pub published: bool,
  pub draft: bool,
}

/// How long and how often to poll an unfinished run
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
  pub timeout: Duration,
  pub poll_interval: Duration,
}

impl From<&PublishConfig> for WaitPolicy {
  fn from(config: &PublishConfig) -> Self {
    Self {
      timeout: config.timeout(),
      poll_interval: config.poll_interval(),
    }
  }
}

/// Resolve `@` and `HEAD` to the checked-out commit; anything else is used as given
pub fn resolve_commit(runner: &dyn CommandRunner, reference: &str) -> DistResult<String> {
  match reference {
    "@" | "HEAD" => {
      let sha = runner.output(&CommandSpec::new("git").args(["rev-parse", "HEAD"]))?;
      let sha = sha.trim();
      if sha.is_empty() {
        return Err(DistError::message("git rev-parse HEAD printed nothing"));
      }
      Ok(sha.to_string())
    }
    other => Ok(other.to_string()),
  }
}

/// Poll until the run completes or the timeout elapses
pub fn wait_for_completion(gh: GhClient<'_>, run_id: u64, policy: WaitPolicy) -> DistResult<RunState> {
  let start = Instant::now();

  loop {
    if start.elapsed() >= policy.timeout {
      return Err(DistError::Publish(PublishError::Timeout {
        run_id,
        seconds: policy.timeout.as_secs(),
      }));
    }

    let state = gh.view_run(run_id)?;
    if state.is_completed() {
      return Ok(state);
    }

    eprintln!("   Waiting for workflow to complete... (status: {})", state.status.as_str());
    std::thread::sleep(policy.poll_interval);
  }
}

/// Drives one publish from commit lookup to release creation
pub struct Publisher<'a> {
  runner: &'a dyn CommandRunner,
  config: &'a PublishConfig,
  wait: WaitPolicy,
}

impl<'a> Publisher<'a> {
  pub fn new(runner: &'a dyn CommandRunner, config: &'a PublishConfig) -> Self {
    Self {
      runner,
      config,
      wait: WaitPolicy::from(config),
    }
  }

  #[cfg(test)]
  pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
    self.wait = wait;
    self
  }

  /// Run the publish flow, writing archive names to `out` unless `quiet`
  pub fn publish(&self, request: &PublishRequest, out: &mut dyn Write, quiet: bool) -> DistResult<PublishOutcome> {
    let gh = GhClient::new(self.runner);
    let commit = resolve_commit(self.runner, &request.commit)?;

    eprintln!("🔍 Looking up workflow run for commit {}...", commit);
    let run = gh
      .list_runs(&commit, &self.config.workflow)?
      .into_iter()
      .next()
      .ok_or_else(|| {
        DistError::Publish(PublishError::NoWorkflowRun {
          commit: commit.clone(),
          workflow: self.config.workflow.clone(),
        })
      })?;
    let run_id = run.database_id;
    eprintln!("   Found workflow run: {} (status: {})", run_id, run.state.status.as_str());

    let state = if run.state.is_completed() {
      run.state
    } else {
      eprintln!("⏳ Workflow is not complete, waiting...");
      wait_for_completion(gh, run_id, self.wait)?
    };

    if state.conclusion() != Some("success") {
      return Err(DistError::Publish(PublishError::RunFailed {
        run_id,
        conclusion: state.conclusion().map(str::to_string),
      }));
    }
    eprintln!("✅ Workflow completed successfully");

    let temp = tempfile::Builder::new().prefix("icu4c-dist-").tempdir()?;
    let download_dir = temp.path().join("downloads");
    std::fs::create_dir_all(&download_dir)?;

    let names = gh.artifact_names(run_id)?;
    eprintln!("📥 Downloading {} artifact(s)...", names.len());
    artifacts::download_all(gh, run_id, &names, &download_dir, self.config.download_workers)?;

    let archives = artifacts::collect_archives(&download_dir)?;
    if archives.is_empty() {
      return Err(DistError::Publish(PublishError::NoArtifacts));
    }

    let archive_names: Vec<String> = archives.iter().map(|p| artifacts::file_name(p)).collect();
    if !quiet {
      eprintln!("\n📦 Artifacts to publish:");
      for name in &archive_names {
        writeln!(out, "{}", name)?;
      }
    }

    let mut release = ReleaseSpec::for_version(&request.version, &commit, archives);
    release.draft = request.draft;

    if request.actually_publish {
      eprintln!("\n🚀 Creating release {}...", release.tag);
      gh.create_release(&release)?;
      eprintln!("✅ Release {} created", release.tag);
    } else {
      eprintln!("\n💡 Dry-run mode. Use --actually-publish to create the release.");
    }

    Ok(PublishOutcome {
      commit,
      run_id,
      tag: release.tag,
      archives: archive_names,
      published: request.actually_publish,
      draft: request.draft,
    })
  }
}
