//! Build target: platform, architecture and ICU version

use crate::core::error::{ConfigError, DistError, DistResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base name of every packaged archive
pub const ARCHIVE_NAME: &str = "icu";

/// Platforms ICU4C is packaged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Platform {
  /// glibc Linux, built in a manylinux_2_28 container
  #[serde(rename = "linux")]
  #[value(name = "linux")]
  Linux,
  /// musl Linux, built in a musllinux_1_2 container
  #[serde(rename = "linux-musl")]
  #[value(name = "linux-musl")]
  LinuxMusl,
  #[serde(rename = "macos")]
  #[value(name = "macos")]
  Macos,
  #[serde(rename = "windows")]
  #[value(name = "windows")]
  Windows,
}

impl Platform {
  pub fn as_str(self) -> &'static str {
    match self {
      Platform::Linux => "linux",
      Platform::LinuxMusl => "linux-musl",
      Platform::Macos => "macos",
      Platform::Windows => "windows",
    }
  }

  /// Platform of the running host
  ///
  /// Linux hosts resolve to glibc Linux; musl has to be asked for explicitly.
  pub fn host() -> DistResult<Self> {
    match std::env::consts::OS {
      "linux" => Ok(Platform::Linux),
      "macos" => Ok(Platform::Macos),
      "windows" => Ok(Platform::Windows),
      other => Err(DistError::Config(ConfigError::UnsupportedHost {
        what: "platform".to_string(),
        value: other.to_string(),
      })),
    }
  }

  /// Container policy whose libc the build must link against
  pub fn container_policy(self) -> Option<&'static str> {
    match self {
      Platform::Linux => Some("manylinux_2_28"),
      Platform::LinuxMusl => Some("musllinux_1_2"),
      Platform::Macos | Platform::Windows => None,
    }
  }

  pub fn needs_container(self) -> bool {
    self.container_policy().is_some()
  }

  /// Platform argument for ICU's runConfigureICU
  pub fn configure_platform(self) -> Option<&'static str> {
    match self {
      Platform::Linux => Some("Linux/gcc"),
      Platform::LinuxMusl => Some("Linux"),
      Platform::Macos => Some("macOS"),
      Platform::Windows => None,
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Host CPU spelled the way the target platform's tooling spells it
pub fn host_arch(platform: Platform) -> DistResult<String> {
  arch_for(platform, std::env::consts::ARCH)
}

fn arch_for(platform: Platform, rust_arch: &str) -> DistResult<String> {
  let arch = match (platform, rust_arch) {
    (Platform::Windows, "x86_64") => "AMD64",
    (Platform::Windows, "aarch64") => "ARM64",
    (Platform::Windows, "x86") => "x86",
    (Platform::Macos, "aarch64") => "arm64",
    (Platform::Macos, "x86_64") => "x86_64",
    (Platform::Linux | Platform::LinuxMusl, "x86") => "i686",
    (Platform::Linux | Platform::LinuxMusl, "x86_64" | "aarch64" | "s390x" | "riscv64") => rust_arch,
    _ => {
      return Err(DistError::Config(ConfigError::UnsupportedHost {
        what: "arch".to_string(),
        value: format!("{} on {}", rust_arch, platform),
      }));
    }
  };
  Ok(arch.to_string())
}

/// What gets built: immutable for the whole invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
  pub platform: Platform,
  pub arch: String,
  pub version: String,
}

impl BuildTarget {
  pub fn new(platform: Platform, arch: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      platform,
      arch: arch.into(),
      version: version.into(),
    }
  }

  /// `<name>-<version>-<platform>-<arch>`, also the archive's top-level directory
  pub fn archive_stem(&self) -> String {
    format!("{}-{}-{}-{}", ARCHIVE_NAME, self.version, self.platform, self.arch)
  }

  /// `<name>-<version>-<platform>-<arch>.tar.gz`
  pub fn archive_file_name(&self) -> String {
    format!("{}.tar.gz", self.archive_stem())
  }

  /// First two version components, as reported by `u_getVersion`
  pub fn major_minor(&self) -> String {
    self.version.split('.').take(2).collect::<Vec<_>>().join(".")
  }
}

impl fmt::Display for BuildTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ICU {} for {}/{}", self.version, self.platform, self.arch)
  }
}
