//! Build plans: what a build will do, computed before anything runs
//!
//! A plan is a pure function of the target, the working paths and the
//! options. It is printed for `--dry-run`, serialized for `--json` and handed
//! to the executor otherwise.
//!
//! ```text
//! BuildTarget + BuildLayout + PlanOptions
//!   ↓
//! BuildPlan (ordered steps)
//!   ↓
//! PlanExecutor (CommandRunner)
//!   ↓
//! BuildReport
//! ```

use super::container::HostBinary;
use super::target::BuildTarget;
use super::verify::SmokeTest;
use super::{container, package, source, unix, verify, windows};
use crate::core::config::{ContainerConfig, WindowsBuildSystem};
use crate::core::error::DistResult;
use crate::core::process::CommandSpec;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Build stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Container,
  Fetch,
  Build,
  Verify,
  Package,
}

impl Stage {
  pub fn title(self) -> &'static str {
    match self {
      Stage::Container => "🐳 Containerize",
      Stage::Fetch => "📥 Fetch",
      Stage::Build => "🔨 Build",
      Stage::Verify => "🧪 Verify",
      Stage::Package => "📦 Package",
    }
  }
}

/// A single unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
  /// Run an external command; failure aborts with its exit code
  Run { command: CommandSpec },

  /// Create a directory (and parents)
  CreateDir { path: PathBuf },

  /// Fetch a URL to a file
  Download { url: String, dest: PathBuf },

  /// Unpack a .tgz into a directory
  Extract { archive: PathBuf, dest: PathBuf },

  /// Copy a directory tree, merging into the target
  CopyTree { from: PathBuf, to: PathBuf, optional: bool },

  /// Compile and run the smoke test against the install tree
  Verify { smoke: SmokeTest },

  /// Archive the install tree under a single top-level directory
  Package {
    install_dir: PathBuf,
    archive: PathBuf,
    root_name: String,
  },
}

impl Operation {
  /// One line per action, for dry-run output
  pub fn summary_lines(&self) -> Vec<String> {
    match self {
      Operation::Run { command } => vec![run_line(command)],
      Operation::CreateDir { path } => vec![format!("mkdir -p {}", path.display())],
      Operation::Download { url, dest } => vec![format!("GET {} -> {}", url, dest.display())],
      Operation::Extract { archive, dest } => {
        vec![format!("extract {} -> {}", archive.display(), dest.display())]
      }
      Operation::CopyTree { from, to, optional } => vec![format!(
        "copy {} -> {}{}",
        from.display(),
        to.display(),
        if *optional { " (if present)" } else { "" }
      )],
      Operation::Verify { smoke } => {
        let mut lines: Vec<String> = smoke
          .files
          .iter()
          .map(|f| format!("write {}", f.path.display()))
          .collect();
        lines.extend(smoke.compile.iter().map(run_line));
        lines.push(run_line(&smoke.run));
        lines.push(format!(
          "expect version={} message={:?}",
          smoke.expected_version, smoke.expected_message
        ));
        lines
      }
      Operation::Package {
        install_dir,
        archive,
        root_name,
      } => vec![format!(
        "tar.gz {} as {}/ -> {}",
        install_dir.display(),
        root_name,
        archive.display()
      )],
    }
  }
}

fn run_line(command: &CommandSpec) -> String {
  match &command.cwd {
    Some(cwd) => format!("$ {}  (in {})", command, cwd.display()),
    None => format!("$ {}", command),
  }
}

/// A described operation within a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
  pub stage: Stage,
  pub description: String,
  pub operation: Operation,
}

impl Step {
  pub fn new(stage: Stage, description: impl Into<String>, operation: Operation) -> Self {
    Self {
      stage,
      description: description.into(),
      operation,
    }
  }

  pub fn run(stage: Stage, description: impl Into<String>, command: CommandSpec) -> Self {
    Self::new(stage, description, Operation::Run { command })
  }
}

/// Working paths for one build, all absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildLayout {
  /// Directory the build was started from (mounted into containers)
  pub root: PathBuf,
  pub work_dir: PathBuf,
  pub output_dir: PathBuf,
}

impl BuildLayout {
  /// Resolve work and output directories against `root` when relative
  pub fn new(root: &Path, work_dir: &Path, output_dir: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      work_dir: root.join(work_dir),
      output_dir: root.join(output_dir),
    }
  }

  pub fn install_dir(&self) -> PathBuf {
    self.work_dir.join("install")
  }

  /// Top of the extracted tarball (`icu/`)
  pub fn source_root(&self) -> PathBuf {
    self.work_dir.join("icu")
  }

  /// ICU4C's `source/` directory
  pub fn source_dir(&self) -> PathBuf {
    self.source_root().join("source")
  }

  pub fn source_archive(&self, version: &str) -> PathBuf {
    self.work_dir.join(format!("icu4c-{}.tgz", version))
  }

  pub fn smoke_dir(&self) -> PathBuf {
    self.work_dir.join("smoke")
  }

  pub fn archive_path(&self, target: &BuildTarget) -> PathBuf {
    self.output_dir.join(target.archive_file_name())
  }
}

/// Knobs that shape the plan but are not part of the target
#[derive(Debug, Clone)]
pub struct PlanOptions {
  /// Already running inside the build container
  pub in_container: bool,
  pub source_url: String,
  pub jobs: usize,
  pub windows_build_system: WindowsBuildSystem,
  pub container: ContainerConfig,
  /// This binary, mounted into the container for the re-exec
  pub executable: PathBuf,
  /// How `executable` was compiled
  pub host: HostBinary,
  /// Explicit config file to forward into the container
  pub config_path: Option<PathBuf>,
  pub verbose: u8,
}

/// Everything one `build` invocation will do
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub id: PlanId,
  pub target: BuildTarget,
  pub archive: PathBuf,
  /// The real work happens in a container re-exec of this binary
  pub delegated: bool,
  pub steps: Vec<Step>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

impl BuildPlan {
  /// Derive the plan for a target
  pub fn compute(target: &BuildTarget, layout: &BuildLayout, options: &PlanOptions) -> DistResult<Self> {
    let mut warnings = Vec::new();
    let delegated = target.platform.needs_container() && !options.in_container;

    let steps = if delegated {
      let (step, warning) = container::container_step(target, layout, options)?;
      warnings.extend(warning);
      vec![step]
    } else {
      let mut steps = source::fetch_steps(target, layout, &options.source_url);
      steps.extend(match target.platform {
        super::Platform::Windows => match options.windows_build_system {
          WindowsBuildSystem::Msbuild => windows::msbuild_steps(target, layout),
          WindowsBuildSystem::Cmake => windows::cmake_steps(target, layout, options.jobs),
        },
        _ => unix::build_steps(target, layout, options.jobs)?,
      });
      steps.push(verify::verify_step(target, layout));
      steps.extend(package::package_steps(target, layout));
      steps
    };

    let id = PlanId::from_contents(&serde_json::to_vec(&(target, &steps))?);

    Ok(Self {
      id,
      target: target.clone(),
      archive: layout.archive_path(target),
      delegated,
      steps,
      warnings,
    })
  }

  /// Dry-run rendering
  pub fn to_human_readable(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("📋 Build plan {} for {}\n", self.id, self.target));
    if self.delegated {
      out.push_str("   (re-executes inside a container; the inner build does the rest)\n");
    } else {
      out.push_str(&format!("   Archive: {}\n", self.archive.display()));
    }

    let mut current = None;
    for step in &self.steps {
      if current != Some(step.stage) {
        out.push_str(&format!("\n{}\n", step.stage.title()));
        current = Some(step.stage);
      }
      out.push_str(&format!("  • {}\n", step.description));
      for line in step.operation.summary_lines() {
        out.push_str(&format!("      {}\n", line));
      }
    }
    out
  }
}
