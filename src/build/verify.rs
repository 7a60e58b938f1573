//! Smoke test against the installed tree
//!
//! A small C++ program is compiled against `install/include` and
//! `install/lib`, then run with the install tree's libraries and data on the
//! loader path. It prints two `key=value` lines which must match the expected
//! ICU major.minor and the expected formatted message.

use super::plan::{BuildLayout, Operation, Stage, Step};
use super::target::{BuildTarget, Platform};
use super::windows::msbuild_platform;
use crate::core::error::{DistError, DistResult, VerifyError};
use crate::core::process::CommandSpec;
use crate::utils::path_to_forward_slashes;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Smoke test program source
pub const SMOKE_SOURCE: &str = include_str!("smoke/icu_smoke.cpp");

/// What the smoke test's MessageFormat call must produce
pub const EXPECTED_MESSAGE: &str = "3 archives for icu4c-dist";

const SMOKE_NAME: &str = "icu_smoke";

/// A file written before compiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
  pub path: PathBuf,
  #[serde(skip)]
  pub contents: String,
}

/// Everything needed to compile, run and judge the smoke test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeTest {
  pub dir: PathBuf,
  pub files: Vec<GeneratedFile>,
  pub compile: Vec<CommandSpec>,
  pub run: CommandSpec,
  pub expected_version: String,
  pub expected_message: String,
}

/// Parsed smoke test output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeReport {
  pub version: String,
  pub message: String,
}

pub fn verify_step(target: &BuildTarget, layout: &BuildLayout) -> Step {
  Step::new(
    Stage::Verify,
    format!("Compile and run smoke test (expect ICU {})", target.major_minor()),
    Operation::Verify {
      smoke: smoke_test(target, layout),
    },
  )
}

pub fn smoke_test(target: &BuildTarget, layout: &BuildLayout) -> SmokeTest {
  let dir = layout.smoke_dir();
  let install = layout.install_dir();
  let source = dir.join(format!("{}.cpp", SMOKE_NAME));
  let data_dir = install.join("share").join("icu").join(&target.version);

  let mut files = vec![GeneratedFile {
    path: source.clone(),
    contents: SMOKE_SOURCE.to_string(),
  }];

  let (compile, run) = match target.platform {
    Platform::Windows => {
      files.push(GeneratedFile {
        path: dir.join("CMakeLists.txt"),
        contents: cmake_project(&install),
      });
      let build_dir = dir.join("build");
      let compile = vec![
        CommandSpec::new("cmake")
          .arg("-S")
          .path_arg(&dir)
          .arg("-B")
          .path_arg(&build_dir)
          .arg("-A")
          .arg(msbuild_platform(&target.arch)),
        CommandSpec::new("cmake")
          .arg("--build")
          .path_arg(&build_dir)
          .args(["--config", "Release"]),
      ];
      let exe = build_dir.join("Release").join(format!("{}.exe", SMOKE_NAME));
      let run = CommandSpec::new(exe.display().to_string())
        .env("ICU_DATA", data_dir.display().to_string())
        .prepend_path(install.join("bin"));
      (compile, run)
    }
    Platform::Linux | Platform::LinuxMusl | Platform::Macos => {
      let lib = install.join("lib");
      let exe = dir.join(SMOKE_NAME);
      let compile = vec![
        CommandSpec::new("c++")
          .arg("-std=c++17")
          .path_arg(&source)
          .arg("-I")
          .path_arg(&install.join("include"))
          .arg("-L")
          .path_arg(&lib)
          .arg(format!("-Wl,-rpath,{}", lib.display()))
          .args(["-licui18n", "-licuuc", "-licudata", "-o"])
          .path_arg(&exe),
      ];
      let loader_var = if target.platform == Platform::Macos {
        "DYLD_LIBRARY_PATH"
      } else {
        "LD_LIBRARY_PATH"
      };
      let run = CommandSpec::new(exe.display().to_string())
        .env("ICU_DATA", data_dir.display().to_string())
        .env(loader_var, lib.display().to_string());
      (compile, run)
    }
  };

  SmokeTest {
    dir,
    files,
    compile,
    run,
    expected_version: target.major_minor(),
    expected_message: EXPECTED_MESSAGE.to_string(),
  }
}

/// CMake project for the smoke test on Windows
pub fn cmake_project(install_dir: &Path) -> String {
  let include = path_to_forward_slashes(&install_dir.join("include"));
  let lib = path_to_forward_slashes(&install_dir.join("lib"));
  format!(
    r#"cmake_minimum_required(VERSION 3.16)
project({name} CXX)
set(CMAKE_CXX_STANDARD 17)
add_executable({name} {name}.cpp)
target_include_directories({name} PRIVATE "{include}")
target_link_directories({name} PRIVATE "{lib}")
target_link_libraries({name} PRIVATE icuin icuuc)
"#,
    name = SMOKE_NAME,
    include = include,
    lib = lib,
  )
}

/// Judge the smoke test's stdout
pub fn check_output(stdout: &str, expected_version: &str, expected_message: &str) -> DistResult<SmokeReport> {
  let field = |key: &str| {
    stdout
      .lines()
      .find_map(|line| line.trim_end().strip_prefix(key)?.strip_prefix('='))
      .map(str::to_string)
  };

  let (Some(version), Some(message)) = (field("version"), field("message")) else {
    return Err(DistError::Verify(VerifyError::MalformedOutput {
      output: stdout.trim().to_string(),
    }));
  };

  if version != expected_version {
    return Err(DistError::Verify(VerifyError::VersionMismatch {
      expected: expected_version.to_string(),
      detected: version,
    }));
  }
  if message != expected_message {
    return Err(DistError::Verify(VerifyError::MessageMismatch {
      expected: expected_message.to_string(),
      detected: message,
    }));
  }

  Ok(SmokeReport { version, message })
}
