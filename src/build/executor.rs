//! Plan execution
//!
//! Walks the steps of a `BuildPlan` in order. External commands go through the
//! injected `CommandRunner`; file operations happen directly. The first failure
//! stops the build.

use super::package::{self, ArchiveReport};
use super::plan::{BuildPlan, Operation, Step};
use super::source;
use super::verify::{self, SmokeReport, SmokeTest};
use crate::core::error::{DistResult, ResultExt};
use crate::core::process::{CommandRunner, CommandSpec};
use crate::utils::{copy_dir_recursive, format_megabytes};
use serde::Serialize;
use std::fs;

/// What a finished build produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
  /// The work was handed to a container re-exec
  pub delegated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub smoke: Option<SmokeReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub archive: Option<ArchiveReport>,
}

/// Executes build plans
pub struct PlanExecutor<'a> {
  runner: &'a dyn CommandRunner,
}

impl<'a> PlanExecutor<'a> {
  pub fn new(runner: &'a dyn CommandRunner) -> Self {
    Self { runner }
  }

  pub fn execute(&self, plan: &BuildPlan) -> DistResult<BuildReport> {
    let mut report = self.execute_steps(&plan.steps)?;
    report.delegated = plan.delegated;
    Ok(report)
  }

  pub fn execute_steps(&self, steps: &[Step]) -> DistResult<BuildReport> {
    let mut report = BuildReport::default();
    let mut stage = None;

    for step in steps {
      if stage != Some(step.stage) {
        println!("\n{}", step.stage.title());
        stage = Some(step.stage);
      }
      println!("  {}", step.description);
      tracing::debug!(stage = ?step.stage, description = %step.description, "executing step");

      self.apply(&step.operation, &mut report)?;
    }

    Ok(report)
  }

  fn apply(&self, operation: &Operation, report: &mut BuildReport) -> DistResult<()> {
    match operation {
      Operation::Run { command } => self.run(command),
      Operation::CreateDir { path } => {
        fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
      }
      Operation::Download { url, dest } => {
        let bytes = source::download(url, dest)?;
        println!("    Downloaded {} ({})", dest.display(), format_megabytes(bytes));
        Ok(())
      }
      Operation::Extract { archive, dest } => source::extract_tgz(archive, dest),
      Operation::CopyTree { from, to, optional } => {
        if *optional && !from.is_dir() {
          println!("    Skipping {} (not present)", from.display());
          return Ok(());
        }
        let copied = copy_dir_recursive(from, to)?;
        tracing::debug!(copied, from = %from.display(), "copied tree");
        Ok(())
      }
      Operation::Verify { smoke } => {
        report.smoke = Some(self.verify(smoke)?);
        Ok(())
      }
      Operation::Package {
        install_dir,
        archive,
        root_name,
      } => {
        let written = package::create_archive(install_dir, archive, root_name)?;
        println!("    Archive: {}", written.path.display());
        println!("    Archive size: {}", format_megabytes(written.size_bytes));
        println!("    SHA-256: {}", written.sha256);
        report.archive = Some(written);
        Ok(())
      }
    }
  }

  fn run(&self, command: &CommandSpec) -> DistResult<()> {
    println!("    Running: {}", command);
    self.runner.run(command)
  }

  fn verify(&self, smoke: &SmokeTest) -> DistResult<SmokeReport> {
    fs::create_dir_all(&smoke.dir).with_context(|| format!("Failed to create {}", smoke.dir.display()))?;
    for file in &smoke.files {
      fs::write(&file.path, &file.contents).with_context(|| format!("Failed to write {}", file.path.display()))?;
    }
    for command in &smoke.compile {
      self.run(command)?;
    }

    println!("    Running: {}", smoke.run);
    let stdout = self.runner.output(&smoke.run)?;

    let result = verify::check_output(&stdout, &smoke.expected_version, &smoke.expected_message);
    match &result {
      Ok(found) => {
        println!("    Detected ICU version: {}", found.version);
        println!("    Expected ICU version: {}", smoke.expected_version);
        println!("    Formatted message: {}", found.message);
        println!("    ✓ ICU version check passed");
      }
      Err(_) => println!("    ✗ ICU smoke test failed"),
    }
    result
  }
}
