//! Configure/make build for Linux and macOS

use super::plan::{BuildLayout, Operation, Stage, Step};
use super::target::BuildTarget;
use crate::core::error::{DistError, DistResult};
use crate::core::process::CommandSpec;

/// Flags shared by every Unix configure run
const CONFIGURE_FLAGS: &[&str] = &[
  "--with-data-packaging=archive",
  "--disable-samples",
  "--disable-tests",
  "--disable-renaming",
  "CPPFLAGS=-DU_CHARSET_IS_UTF8=1",
];

pub fn build_steps(target: &BuildTarget, layout: &BuildLayout, jobs: usize) -> DistResult<Vec<Step>> {
  let configure_platform = target
    .platform
    .configure_platform()
    .ok_or_else(|| DistError::message(format!("{} has no runConfigureICU platform", target.platform)))?;
  let source = layout.source_dir();

  Ok(vec![
    Step::run(
      Stage::Build,
      "Make configure scripts executable",
      CommandSpec::new("chmod")
        .args(["+x", "configure", "runConfigureICU", "install-sh"])
        .current_dir(&source),
    ),
    Step::run(
      Stage::Build,
      format!("Configure for {}", configure_platform),
      CommandSpec::new(source.join("runConfigureICU").display().to_string())
        .arg(configure_platform)
        .arg(format!("--prefix={}", layout.install_dir().display()))
        .args(CONFIGURE_FLAGS.iter().copied())
        .current_dir(&source),
    ),
    Step::new(
      Stage::Build,
      "Create data staging directory",
      Operation::CreateDir {
        path: source.join("data").join("out").join("tmp"),
      },
    ),
    Step::run(
      Stage::Build,
      format!("Compile with {} jobs", jobs),
      CommandSpec::new("make").arg(format!("-j{}", jobs)).current_dir(&source),
    ),
    Step::run(
      Stage::Build,
      "Install into staging prefix",
      CommandSpec::new("make").arg("install").current_dir(&source),
    ),
  ])
}
