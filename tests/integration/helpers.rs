//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch directory with a `bin/` of fake tools put first on PATH
pub struct TestDir {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestDir {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::create_dir_all(path.join("bin"))?;
    Ok(Self { _root: root, path })
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.path.join("bin")
  }

  /// Write a file relative to the test directory
  pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
    let path = self.path.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(path)
  }

  /// Install an executable shell script as `bin/<name>`
  #[cfg(unix)]
  pub fn fake_tool(&self, name: &str, script: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = self.bin_dir().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", script))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
  }

  /// Lines appended by fake tools to `calls.log`
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.path.join("calls.log"))
      .map(|s| s.lines().map(String::from).collect())
      .unwrap_or_default()
  }

  pub fn log_path(&self) -> PathBuf {
    self.path.join("calls.log")
  }
}

/// Run icu4c-dist in `cwd` with the fake tools first on PATH, whatever the exit status
pub fn run_icu4c_dist_raw(dir: &TestDir, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_icu4c-dist");

  let mut paths = vec![dir.bin_dir()];
  if let Some(existing) = std::env::var_os("PATH") {
    paths.extend(std::env::split_paths(&existing));
  }

  Command::new(bin)
    .current_dir(&dir.path)
    .args(args)
    .env("PATH", std::env::join_paths(paths)?)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run icu4c-dist")
}

/// Run icu4c-dist and fail unless it exits successfully
pub fn run_icu4c_dist(dir: &TestDir, args: &[&str]) -> Result<Output> {
  let output = run_icu4c_dist_raw(dir, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "icu4c-dist command failed: icu4c-dist {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Write a zip containing one file
pub fn write_zip(path: &Path, name: &str, contents: &[u8]) -> Result<()> {
  use std::io::Write;

  let mut zip = zip::ZipWriter::new(std::fs::File::create(path)?);
  zip.start_file(name, zip::write::SimpleFileOptions::default())?;
  zip.write_all(contents)?;
  zip.finish()?;
  Ok(())
}
