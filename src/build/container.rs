//! Container re-execution for Linux targets
//!
//! Linux archives must link against an old, portable libc, so the build runs
//! inside a manylinux/musllinux image. The host side only launches the
//! container, mounting the working directory at `/work` and a Linux build of
//! icu4c-dist at `/usr/local/bin/icu4c-dist`, and re-invokes
//! `build --in-container` there.
//!
//! The mounted binary has to start in both manylinux and musllinux images, so
//! it must be statically linked against musl for the container's architecture.
//! Either the running binary is such a build, or `[container] executable`
//! points at one.

use super::plan::{BuildLayout, PlanOptions, Stage, Step};
use super::target::BuildTarget;
use crate::core::error::{DistError, DistResult};
use crate::core::process::CommandSpec;
use crate::utils::path_to_forward_slashes;
use std::path::{Component, Path, PathBuf};

/// Mount point of the working directory inside the container
pub const CONTAINER_ROOT: &str = "/work";

/// Where this binary is mounted inside the container
pub const CONTAINER_EXE: &str = "/usr/local/bin/icu4c-dist";

/// How the running binary was compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBinary {
  pub os: &'static str,
  pub env: &'static str,
  pub arch: &'static str,
}

impl HostBinary {
  pub fn current() -> Self {
    let env = if cfg!(target_env = "musl") {
      "musl"
    } else if cfg!(target_env = "gnu") {
      "gnu"
    } else {
      ""
    };
    Self {
      os: std::env::consts::OS,
      env,
      arch: std::env::consts::ARCH,
    }
  }

  /// Starts inside a Linux container for `arch` (musl targets link statically)
  pub fn runs_in_container(&self, arch: &str) -> bool {
    let arch = match arch {
      "i686" => "x86",
      other => other,
    };
    self.os == "linux" && self.env == "musl" && self.arch == arch
  }
}

/// Rust target that produces a binary usable inside the container
pub fn musl_target(arch: &str) -> String {
  format!("{}-unknown-linux-musl", arch)
}

/// Host path of the binary mounted as `icu4c-dist` inside the container
pub fn container_executable(arch: &str, root: &Path, options: &PlanOptions) -> DistResult<PathBuf> {
  if let Some(configured) = &options.container.executable {
    let path = root.join(configured);
    if !path.is_file() {
      return Err(DistError::with_help(
        format!("Container executable {} does not exist", path.display()),
        format!(
          "Build it with `cargo build --release --target {}` and point [container] executable at the result.",
          musl_target(arch)
        ),
      ));
    }
    return Ok(path);
  }

  if options.host.runs_in_container(arch) {
    return Ok(options.executable.clone());
  }

  Err(DistError::with_help(
    format!(
      "This icu4c-dist binary ({}-{}-{}) cannot run inside a linux/{} build container",
      options.host.arch,
      options.host.os,
      if options.host.env.is_empty() { "unknown" } else { options.host.env },
      arch
    ),
    format!(
      "Build a static binary with `cargo build --release --target {}` and either run that one or set \
       [container] executable to its path in icu4c-dist.toml.",
      musl_target(arch)
    ),
  ))
}

/// Image chosen for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageChoice {
  pub image: String,
  /// Came from the pinned table rather than the generic fallback
  pub pinned: bool,
}

/// Pick the image for an arch/policy pair, preferring a pinned one
pub fn resolve_image(arch: &str, policy: &str, options: &PlanOptions) -> ImageChoice {
  match options.container.pinned_image(arch, policy) {
    Some(image) => ImageChoice {
      image: image.to_string(),
      pinned: true,
    },
    None => ImageChoice {
      image: format!("quay.io/pypa/{}_{}", policy, arch),
      pinned: false,
    },
  }
}

/// `--platform` value for the container engine
pub fn container_platform(arch: &str) -> String {
  match arch {
    "x86_64" => "linux/amd64".to_string(),
    "i686" => "linux/386".to_string(),
    "aarch64" => "linux/arm64".to_string(),
    other => format!("linux/{}", other),
  }
}

/// Translate a host path under the build root into its container path
fn to_container_path(root: &Path, path: &Path) -> DistResult<String> {
  let outside = || {
    DistError::with_help(
      format!(
        "{} is outside {}, which is the only directory mounted into the container",
        path.display(),
        root.display()
      ),
      "Use --work-dir and --output-dir paths inside the current directory for Linux builds.",
    )
  };

  let relative = path.strip_prefix(root).map_err(|_| outside())?;
  if relative.components().any(|c| matches!(c, Component::ParentDir)) {
    return Err(outside());
  }

  let relative = path_to_forward_slashes(relative);
  if relative.is_empty() {
    Ok(CONTAINER_ROOT.to_string())
  } else {
    Ok(format!("{}/{}", CONTAINER_ROOT, relative))
  }
}

/// The single step of a delegated build, plus a warning when the image is not pinned
pub fn container_step(
  target: &BuildTarget,
  layout: &BuildLayout,
  options: &PlanOptions,
) -> DistResult<(Step, Option<String>)> {
  let policy = target
    .platform
    .container_policy()
    .ok_or_else(|| DistError::message(format!("{} does not build in a container", target.platform)))?;

  let executable = container_executable(&target.arch, &layout.root, options)?;
  let choice = resolve_image(&target.arch, policy, options);
  let warning = (!choice.pinned).then(|| {
    format!(
      "No pinned {} image for {}; falling back to {}",
      policy, target.arch, choice.image
    )
  });

  let mut command = CommandSpec::new(options.container.engine.clone())
    .args(["run", "--rm", "-v"])
    .arg(format!("{}:{}", layout.root.display(), CONTAINER_ROOT))
    .args(["-w", CONTAINER_ROOT, "-v"])
    .arg(format!("{}:{}:ro", executable.display(), CONTAINER_EXE))
    .arg("--platform")
    .arg(container_platform(&target.arch))
    .arg(choice.image.clone())
    .args([CONTAINER_EXE, "build", "--platform", target.platform.as_str()])
    .args(["--arch", target.arch.as_str()])
    .arg("--output-dir")
    .arg(to_container_path(&layout.root, &layout.output_dir)?)
    .arg("--work-dir")
    .arg(to_container_path(&layout.root, &layout.work_dir)?)
    .arg("--in-container");

  if let Some(config) = &options.config_path {
    let absolute = layout.root.join(config);
    command = command.arg("--config").arg(to_container_path(&layout.root, &absolute)?);
  }
  if options.verbose > 0 {
    command = command.arg(format!("-{}", "v".repeat(options.verbose as usize)));
  }

  let step = Step::run(
    Stage::Container,
    format!("Build {} inside {}", target, choice.image),
    command,
  );
  Ok((step, warning))
}
