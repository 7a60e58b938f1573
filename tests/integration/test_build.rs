//! Integration tests for `icu4c-dist build` planning and container delegation

use crate::helpers::{TestDir, run_icu4c_dist, run_icu4c_dist_raw};
use anyhow::Result;
use std::path::Path;

fn plan_json(dir: &TestDir, args: &[&str]) -> Result<serde_json::Value> {
  let output = run_icu4c_dist(dir, args)?;
  Ok(serde_json::from_slice(&output.stdout)?)
}

fn step_programs(plan: &serde_json::Value) -> Vec<String> {
  plan["steps"]
    .as_array()
    .map(|steps| {
      steps
        .iter()
        .filter_map(|s| s["operation"]["command"]["program"].as_str())
        .map(|program| {
          Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
        })
        .collect()
    })
    .unwrap_or_default()
}

/// Stand-in for a static musl build of icu4c-dist, wired up through the config
fn with_container_executable(dir: &TestDir, extra_config: &str) -> Result<()> {
  dir.write("icu4c-dist-musl", "static binary")?;
  dir.write(
    "icu4c-dist.toml",
    &format!("[container]\nexecutable = \"icu4c-dist-musl\"\n{}", extra_config),
  )?;
  Ok(())
}

#[test]
fn test_linux_plan_delegates_to_container() -> Result<()> {
  let dir = TestDir::new()?;
  with_container_executable(&dir, "")?;
  let plan = plan_json(&dir, &["build", "--platform", "linux", "--arch", "x86_64", "--json"])?;

  assert_eq!(plan["delegated"], true);
  assert_eq!(plan["steps"].as_array().map(Vec::len), Some(1));

  let command = &plan["steps"][0]["operation"]["command"];
  assert_eq!(command["program"], "docker");
  let args: Vec<&str> = command["args"]
    .as_array()
    .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
    .unwrap_or_default();
  assert!(args.contains(&"quay.io/pypa/manylinux_2_28_x86_64"));
  assert!(args.contains(&"linux/amd64"));
  assert!(args.contains(&"--in-container"));
  assert!(args.iter().any(|a| a.ends_with("/icu4c-dist-musl:/usr/local/bin/icu4c-dist:ro")));
  Ok(())
}

#[cfg(not(target_env = "musl"))]
#[test]
fn test_dynamic_binary_is_not_mounted_into_container() -> Result<()> {
  let dir = TestDir::new()?;
  let output = run_icu4c_dist_raw(&dir, &["build", "--platform", "linux", "--arch", "x86_64", "--json"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("cannot run inside a linux/x86_64 build container"));
  assert!(stderr.contains("x86_64-unknown-linux-musl"));
  Ok(())
}

#[test]
fn test_output_dir_above_cwd_is_rejected_for_container_builds() -> Result<()> {
  let dir = TestDir::new()?;
  with_container_executable(&dir, "")?;
  let output = run_icu4c_dist_raw(
    &dir,
    &["build", "--platform", "linux", "--arch", "x86_64", "--output-dir", "../dist", "--dry-run"],
  )?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("only directory mounted into the container"));
  Ok(())
}

#[test]
fn test_in_container_plan_runs_configure_and_make() -> Result<()> {
  let dir = TestDir::new()?;
  let plan = plan_json(
    &dir,
    &["build", "--platform", "linux-musl", "--arch", "aarch64", "--in-container", "--json"],
  )?;

  assert_eq!(plan["delegated"], false);
  assert_eq!(
    step_programs(&plan),
    vec!["chmod", "runConfigureICU", "make", "make"]
  );
  assert!(
    plan["archive"]
      .as_str()
      .unwrap_or_default()
      .ends_with("dist/icu-78.2-linux-musl-aarch64.tar.gz")
  );
  Ok(())
}

#[test]
fn test_windows_build_system_selects_procedure() -> Result<()> {
  let dir = TestDir::new()?;

  let msbuild = plan_json(&dir, &["build", "--platform", "windows", "--arch", "AMD64", "--json"])?;
  assert_eq!(step_programs(&msbuild), vec!["msbuild"]);

  let cmake = plan_json(
    &dir,
    &[
      "build",
      "--platform",
      "windows",
      "--arch",
      "ARM64",
      "--windows-build-system",
      "cmake",
      "--json",
    ],
  )?;
  assert_eq!(step_programs(&cmake), vec!["cmake", "cmake", "cmake"]);
  Ok(())
}

#[test]
fn test_dry_run_is_human_readable() -> Result<()> {
  let dir = TestDir::new()?;
  let output = run_icu4c_dist(&dir, &["build", "--platform", "macos", "--arch", "arm64", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("icu-78.2-macos-arm64.tar.gz"));
  assert!(stdout.contains("icu/source/runConfigureICU macOS"));
  assert!(stdout.contains("icu4c-78.2-sources.tgz"));
  assert!(!dir.path.join("build").exists());
  Ok(())
}

#[test]
fn test_config_file_sets_version() -> Result<()> {
  let dir = TestDir::new()?;
  dir.write("icu4c-dist.toml", "[icu]\nversion = \"77.1\"\n\n[build]\noutput_dir = \"out\"\n")?;

  let plan = plan_json(&dir, &["build", "--platform", "macos", "--arch", "x86_64", "--json"])?;
  assert_eq!(plan["target"]["version"], "77.1");
  assert!(
    plan["archive"]
      .as_str()
      .unwrap_or_default()
      .ends_with("out/icu-77.1-macos-x86_64.tar.gz")
  );
  Ok(())
}

#[test]
fn test_missing_explicit_config_fails() -> Result<()> {
  let dir = TestDir::new()?;
  let output = run_icu4c_dist_raw(&dir, &["build", "--config", "nope.toml", "--platform", "macos", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_container_engine_exit_code_is_propagated() -> Result<()> {
  let dir = TestDir::new()?;
  with_container_executable(&dir, "")?;
  dir.fake_tool(
    "docker",
    &format!(r#"echo "docker $*" >> "{}"; exit 17"#, dir.log_path().display()),
  )?;

  let output = run_icu4c_dist_raw(&dir, &["build", "--platform", "linux", "--arch", "aarch64"])?;
  assert_eq!(output.status.code(), Some(17));

  let calls = dir.calls();
  assert_eq!(calls.len(), 1);
  assert!(calls[0].contains("--platform linux/arm64"));
  assert!(calls[0].contains("quay.io/pypa/manylinux_2_28_aarch64"));
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_successful_container_build_reports_delegation() -> Result<()> {
  let dir = TestDir::new()?;
  with_container_executable(
    &dir,
    "engine = \"podman\"\n\n[container.images]\n\"x86_64.musllinux_1_2\" = \"example.org/musl:pinned\"\n",
  )?;
  dir.fake_tool("podman", &format!(r#"echo "podman $*" >> "{}""#, dir.log_path().display()))?;

  let output = run_icu4c_dist(&dir, &["build", "--platform", "linux-musl", "--arch", "x86_64"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Container build finished"));
  assert!(!String::from_utf8_lossy(&output.stderr).contains("falling back"));
  assert!(dir.calls()[0].contains("example.org/musl:pinned"));
  Ok(())
}
