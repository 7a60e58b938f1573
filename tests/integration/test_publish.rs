//! Integration tests for `icu4c-dist publish`, driven by fake `gh` and `git`
#![cfg(unix)]

use crate::helpers::{TestDir, run_icu4c_dist, run_icu4c_dist_raw, write_zip};
use anyhow::Result;

const COMPLETED_OK: &str = r#"[{"conclusion":"success","databaseId":4242,"status":"completed"}]"#;

/// Fake `gh` answering from `fixtures/` and logging every call
fn install_fake_gh(dir: &TestDir, runs: &str) -> Result<()> {
  let fixtures = dir.path.join("fixtures");
  std::fs::create_dir_all(&fixtures)?;
  std::fs::write(fixtures.join("runs.json"), runs)?;
  std::fs::write(
    fixtures.join("artifacts.json"),
    r#"{"total_count":2,"artifacts":[{"name":"windows-build"},{"name":"linux-build"}]}"#,
  )?;
  write_zip(
    &fixtures.join("linux-build.zip"),
    "icu-78.2-linux-x86_64.tar.gz",
    b"linux tarball",
  )?;
  write_zip(
    &fixtures.join("windows-build.zip"),
    "icu-78.2-windows-AMD64.tar.gz",
    b"windows tarball",
  )?;

  dir.fake_tool(
    "gh",
    &format!(
      r#"echo "gh $*" >> "{log}"
case "$1 $2" in
  "run list") cat "{fixtures}/runs.json" ;;
  "api "*) cat "{fixtures}/artifacts.json" ;;
  "run download")
    name=""; dest=""
    while [ $# -gt 0 ]; do
      case "$1" in
        --name) name="$2"; shift ;;
        --dir) dest="$2"; shift ;;
      esac
      shift
    done
    mkdir -p "$dest" && cp "{fixtures}/$name.zip" "$dest/"
    ;;
  "release create") ;;
  *) echo "unexpected: gh $*" >&2; exit 64 ;;
esac"#,
      log = dir.log_path().display(),
      fixtures = fixtures.display(),
    ),
  )?;

  dir.fake_tool(
    "git",
    &format!(r#"echo "git $*" >> "{}"; echo abc123"#, dir.log_path().display()),
  )?;
  Ok(())
}

#[test]
fn test_dry_run_prints_sorted_archives() -> Result<()> {
  let dir = TestDir::new()?;
  install_fake_gh(&dir, COMPLETED_OK)?;

  let output = run_icu4c_dist(&dir, &["publish", "abc123", "78.2"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(stdout, "icu-78.2-linux-x86_64.tar.gz\nicu-78.2-windows-AMD64.tar.gz\n");

  let calls = dir.calls();
  assert!(calls.iter().any(|c| c.starts_with("gh run list --commit abc123 --workflow .github/workflows/main.yml")));
  assert_eq!(calls.iter().filter(|c| c.starts_with("gh run download 4242")).count(), 2);
  assert!(!calls.iter().any(|c| c.starts_with("gh release")));
  assert!(!calls.iter().any(|c| c.starts_with("gh run view")));
  Ok(())
}

#[test]
fn test_head_is_resolved_and_release_created() -> Result<()> {
  let dir = TestDir::new()?;
  install_fake_gh(&dir, COMPLETED_OK)?;

  let output = run_icu4c_dist(&dir, &["publish", "@", "78.2", "--actually-publish", "--json"])?;
  let outcome: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(outcome["commit"], "abc123");
  assert_eq!(outcome["published"], true);
  assert_eq!(outcome["tag"], "v78.2");
  assert_eq!(outcome["archives"].as_array().map(Vec::len), Some(2));

  let calls = dir.calls();
  assert!(calls.iter().any(|c| c == "git rev-parse HEAD"));
  let release = calls
    .iter()
    .find(|c| c.starts_with("gh release create v78.2"))
    .expect("release should be created");
  assert!(release.contains("--target abc123"));
  assert!(release.contains("icu-78.2-linux-x86_64.tar.gz"));
  assert!(release.contains("icu-78.2-windows-AMD64.tar.gz"));
  Ok(())
}

#[test]
fn test_missing_run_exits_one_without_downloads() -> Result<()> {
  let dir = TestDir::new()?;
  install_fake_gh(&dir, "[]")?;

  let output = run_icu4c_dist_raw(&dir, &["publish", "abc123", "78.2"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("No workflow run found for commit abc123"));
  assert!(!dir.calls().iter().any(|c| c.starts_with("gh run download") || c.starts_with("gh api")));
  Ok(())
}

#[test]
fn test_failed_run_exits_one() -> Result<()> {
  let dir = TestDir::new()?;
  install_fake_gh(&dir, r#"[{"conclusion":"cancelled","databaseId":17,"status":"completed"}]"#)?;

  let output = run_icu4c_dist_raw(&dir, &["publish", "abc123", "78.2", "--actually-publish"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("cancelled"));
  assert!(!dir.calls().iter().any(|c| c.starts_with("gh release")));
  Ok(())
}

#[test]
fn test_gh_exit_code_is_propagated() -> Result<()> {
  let dir = TestDir::new()?;
  dir.fake_tool("gh", "echo 'gh: not logged in' >&2; exit 4")?;

  let output = run_icu4c_dist_raw(&dir, &["publish", "abc123", "78.2"])?;
  assert_eq!(output.status.code(), Some(4));
  Ok(())
}
