//! Native Windows builds: MSBuild solution or CMake
//!
//! The MSBuild solution has no install target. Its outputs land next to the
//! source tree (`bin64/`, `lib64/`, ...) and are copied into the same
//! `bin/ lib/ include/ share/` layout the Unix install produces.

use super::plan::{BuildLayout, Operation, Stage, Step};
use super::target::BuildTarget;
use crate::core::process::CommandSpec;

/// Header directories under `source/` that make up the public API
const HEADER_DIRS: &[&str] = &["common", "i18n", "io"];

/// MSBuild `/p:Platform=` for an architecture
pub fn msbuild_platform(arch: &str) -> &'static str {
  match arch {
    "AMD64" => "x64",
    "ARM64" => "ARM64",
    _ => "Win32",
  }
}

/// Output directory names (bin, lib) the solution writes for a platform
fn output_dirs(arch: &str) -> (&'static str, &'static str) {
  match msbuild_platform(arch) {
    "x64" => ("bin64", "lib64"),
    "ARM64" => ("binARM64", "libARM64"),
    _ => ("bin", "lib"),
  }
}

fn copy_step(description: String, from: std::path::PathBuf, to: std::path::PathBuf) -> Step {
  Step::new(
    Stage::Build,
    description,
    Operation::CopyTree {
      from,
      to,
      optional: true,
    },
  )
}

pub fn msbuild_steps(target: &BuildTarget, layout: &BuildLayout) -> Vec<Step> {
  let source = layout.source_dir();
  let root = layout.source_root();
  let install = layout.install_dir();
  let platform = msbuild_platform(&target.arch);
  let (bin, lib) = output_dirs(&target.arch);

  let mut steps = vec![
    Step::run(
      Stage::Build,
      format!("Build allinone.sln for {}", platform),
      CommandSpec::new("msbuild")
        .path_arg(&source.join("allinone").join("allinone.sln"))
        .arg("/p:Configuration=Release")
        .arg(format!("/p:Platform={}", platform))
        .arg("/m"),
    ),
    Step::new(
      Stage::Build,
      "Create install layout",
      Operation::CreateDir {
        path: install.join("include").join("unicode"),
      },
    ),
    copy_step(format!("Copy {}/ to install/bin", bin), root.join(bin), install.join("bin")),
    copy_step(format!("Copy {}/ to install/lib", lib), root.join(lib), install.join("lib")),
  ];

  steps.extend(HEADER_DIRS.iter().map(|dir| {
    copy_step(
      format!("Copy {} headers", dir),
      source.join(dir).join("unicode"),
      install.join("include").join("unicode"),
    )
  }));

  steps.push(copy_step(
    "Copy data files".to_string(),
    root.join("data"),
    install.join("share").join("icu").join(&target.version),
  ));

  steps
}

pub fn cmake_steps(target: &BuildTarget, layout: &BuildLayout, jobs: usize) -> Vec<Step> {
  let build_dir = layout.work_dir.join("cmake-build");

  vec![
    Step::run(
      Stage::Build,
      "Configure with CMake",
      CommandSpec::new("cmake")
        .arg("-S")
        .path_arg(&layout.source_dir())
        .arg("-B")
        .path_arg(&build_dir)
        .arg("-A")
        .arg(msbuild_platform(&target.arch))
        .arg("-DCMAKE_BUILD_TYPE=Release")
        .arg(format!("-DCMAKE_INSTALL_PREFIX={}", layout.install_dir().display())),
    ),
    Step::run(
      Stage::Build,
      format!("Compile with {} jobs", jobs),
      CommandSpec::new("cmake")
        .arg("--build")
        .path_arg(&build_dir)
        .args(["--config", "Release", "--parallel"])
        .arg(jobs.to_string()),
    ),
    Step::run(
      Stage::Build,
      "Install into staging prefix",
      CommandSpec::new("cmake")
        .arg("--install")
        .path_arg(&build_dir)
        .args(["--config", "Release"]),
    ),
  ]
}
