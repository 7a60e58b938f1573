use crate::core::error::{ConfigError, DistError, DistResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ICU release built when nothing else is configured
pub const DEFAULT_ICU_VERSION: &str = "78.2";

/// Source tarball location; `{version}` is replaced with the ICU version
pub const DEFAULT_SOURCE_URL: &str =
  "https://github.com/unicode-org/icu/releases/download/release-{version}/icu4c-{version}-sources.tgz";

/// Workflow whose runs produce the release archives
pub const DEFAULT_WORKFLOW: &str = ".github/workflows/main.yml";

/// Configuration for icu4c-dist
/// Searched in order: icu4c-dist.toml, .icu4c-dist.toml, .config/icu4c-dist.toml
///
/// Every field has a default, so running without a config file is normal.
///
/// # Example
///
/// ```toml
/// [icu]
/// version = "78.2"
///
/// [build]
/// output_dir = "dist"
/// windows_build_system = "cmake"
///
/// [container]
/// engine = "podman"
/// executable = "target/x86_64-unknown-linux-musl/release/icu4c-dist"
///
/// [container.images]
/// "x86_64.manylinux_2_28" = "quay.io/pypa/manylinux_2_28_x86_64:2025.01.01-1"
///
/// [publish]
/// timeout_secs = 3600
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistConfig {
  pub icu: IcuConfig,
  pub build: BuildConfig,
  pub container: ContainerConfig,
  pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IcuConfig {
  pub version: String,
  pub source_url: String,
}

impl Default for IcuConfig {
  fn default() -> Self {
    Self {
      version: DEFAULT_ICU_VERSION.to_string(),
      source_url: DEFAULT_SOURCE_URL.to_string(),
    }
  }
}

impl IcuConfig {
  /// Source tarball URL for the configured version
  pub fn source_url(&self) -> String {
    self.source_url.replace("{version}", &self.version)
  }
}

/// Which native build procedure to use on Windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowsBuildSystem {
  /// allinone.sln via msbuild, then copy into an install layout
  #[default]
  Msbuild,
  /// CMake configure/build/install
  Cmake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Scratch directory for the source tree and install tree
  pub work_dir: PathBuf,
  /// Where packaged archives are written
  pub output_dir: PathBuf,
  pub windows_build_system: WindowsBuildSystem,
  /// Parallel make jobs (default: available CPUs)
  pub jobs: Option<usize>,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      work_dir: PathBuf::from("build"),
      output_dir: PathBuf::from("dist"),
      windows_build_system: WindowsBuildSystem::default(),
      jobs: None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
  /// docker or podman
  pub engine: String,
  /// Pinned images keyed by "<arch>.<policy>", e.g. "aarch64.musllinux_1_2"
  pub images: BTreeMap<String, String>,
  /// Static musl build of icu4c-dist to run inside the container, relative
  /// to the working directory. Defaults to the running binary.
  pub executable: Option<PathBuf>,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      engine: "docker".to_string(),
      images: BTreeMap::new(),
      executable: None,
    }
  }
}

impl ContainerConfig {
  /// Pinned image for an architecture and container policy
  pub fn pinned_image(&self, arch: &str, policy: &str) -> Option<&str> {
    self.images.get(&format!("{}.{}", arch, policy)).map(String::as_str)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
  /// Workflow file passed to `gh run list --workflow`
  pub workflow: String,
  pub timeout_secs: u64,
  pub poll_interval_secs: u64,
  pub download_workers: usize,
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      workflow: DEFAULT_WORKFLOW.to_string(),
      timeout_secs: 1800,
      poll_interval_secs: 10,
      download_workers: 8,
    }
  }
}

impl PublishConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }
}

impl DistConfig {
  /// Find config file in search order: icu4c-dist.toml, .icu4c-dist.toml, .config/icu4c-dist.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("icu4c-dist.toml"),
      path.join(".icu4c-dist.toml"),
      path.join(".config").join("icu4c-dist.toml"),
    ];

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load config for a directory, or an explicit file when given
  ///
  /// Falls back to defaults when no file is found by searching. An explicit
  /// path that does not exist is an error.
  pub fn load(root: &Path, explicit: Option<&Path>) -> DistResult<Self> {
    let config_path = match explicit {
      Some(path) if !path.is_file() => {
        return Err(DistError::Config(ConfigError::NotFound {
          path: path.to_path_buf(),
        }));
      }
      Some(path) => path.to_path_buf(),
      None => match Self::find_config_path(root) {
        Some(path) => path,
        None => {
          tracing::debug!(root = %root.display(), "no config file, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "loaded config");

    Ok(config)
  }

  /// Parse and validate TOML text
  pub fn parse(content: &str) -> DistResult<Self> {
    let config: DistConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate field values
  pub fn validate(&self) -> DistResult<()> {
    if self.icu.version.trim().is_empty() {
      return Err(invalid("icu.version", "must not be empty"));
    }
    if !self.icu.version.split('.').all(|part| part.parse::<u32>().is_ok()) {
      return Err(invalid("icu.version", "must be dot-separated numbers, e.g. \"78.2\""));
    }
    if !self.icu.source_url.starts_with("https://") && !self.icu.source_url.starts_with("http://") {
      return Err(invalid("icu.source_url", "must be an http(s) URL"));
    }
    if self.build.jobs == Some(0) {
      return Err(invalid("build.jobs", "must be at least 1"));
    }
    if self.container.engine.trim().is_empty() {
      return Err(invalid("container.engine", "must not be empty"));
    }
    if self.publish.download_workers == 0 {
      return Err(invalid("publish.download_workers", "must be at least 1"));
    }
    if self.publish.poll_interval_secs == 0 {
      return Err(invalid("publish.poll_interval_secs", "must be at least 1"));
    }
    Ok(())
  }
}

fn invalid(field: &str, reason: &str) -> DistError {
  DistError::Config(ConfigError::InvalidValue {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_match_release_workflow() {
    let config = DistConfig::default();
    assert_eq!(config.icu.version, "78.2");
    assert_eq!(
      config.icu.source_url(),
      "https://github.com/unicode-org/icu/releases/download/release-78.2/icu4c-78.2-sources.tgz"
    );
    assert_eq!(config.publish.workflow, ".github/workflows/main.yml");
    assert_eq!(config.publish.timeout_secs, 1800);
    assert_eq!(config.publish.poll_interval_secs, 10);
    assert_eq!(config.publish.download_workers, 8);
    assert_eq!(config.container.engine, "docker");
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let config = DistConfig::parse(
      r#"
[icu]
version = "77.1"

[build]
windows_build_system = "cmake"

[container.images]
"aarch64.musllinux_1_2" = "example.org/musl:pinned"
"#,
    )
    .unwrap();

    assert_eq!(config.icu.version, "77.1");
    assert_eq!(config.build.windows_build_system, WindowsBuildSystem::Cmake);
    assert_eq!(config.build.output_dir, PathBuf::from("dist"));
    assert_eq!(
      config.container.pinned_image("aarch64", "musllinux_1_2"),
      Some("example.org/musl:pinned")
    );
    assert_eq!(config.container.pinned_image("x86_64", "musllinux_1_2"), None);
    assert_eq!(config.publish.download_workers, 8);
  }

  #[test]
  fn test_validation_rejects_bad_values() {
    assert!(DistConfig::parse("[publish]\ndownload_workers = 0\n").is_err());
    assert!(DistConfig::parse("[publish]\npoll_interval_secs = 0\n").is_err());
    assert!(DistConfig::parse("[icu]\nversion = \"seventy-eight\"\n").is_err());
    assert!(DistConfig::parse("[build]\njobs = 0\n").is_err());
  }

  #[test]
  fn test_search_order_and_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(DistConfig::find_config_path(dir.path()).is_none());
    assert_eq!(DistConfig::load(dir.path(), None).unwrap().icu.version, "78.2");

    fs::create_dir_all(dir.path().join(".config")).unwrap();
    fs::write(dir.path().join(".config/icu4c-dist.toml"), "[icu]\nversion = \"76.1\"\n").unwrap();
    fs::write(dir.path().join("icu4c-dist.toml"), "[icu]\nversion = \"77.1\"\n").unwrap();
    assert_eq!(
      DistConfig::find_config_path(dir.path()),
      Some(dir.path().join("icu4c-dist.toml"))
    );
    assert_eq!(DistConfig::load(dir.path(), None).unwrap().icu.version, "77.1");
  }

  #[test]
  fn test_explicit_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = DistConfig::load(dir.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, DistError::Config(ConfigError::NotFound { .. })));
  }
}
