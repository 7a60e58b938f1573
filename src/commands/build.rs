//! `build` command

use super::GlobalOptions;
use crate::build::container::HostBinary;
use crate::build::target::host_arch;
use crate::build::{BuildLayout, BuildPlan, BuildTarget, PlanExecutor, PlanOptions, Platform};
use crate::core::config::{DistConfig, WindowsBuildSystem};
use crate::core::error::DistResult;
use crate::core::process::SystemRunner;
use crate::utils::format_megabytes;
use clap::Args;
use std::env;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
  /// Target platform (default: this host)
  #[arg(long, value_enum)]
  pub platform: Option<Platform>,
  /// Target architecture, e.g. x86_64, aarch64, arm64, AMD64 (default: this host)
  #[arg(long)]
  pub arch: Option<String>,
  /// Directory for the packaged archive (default: build.output_dir, "dist")
  #[arg(long)]
  pub output_dir: Option<PathBuf>,
  /// Scratch directory for sources and the install tree (default: build.work_dir, "build")
  #[arg(long)]
  pub work_dir: Option<PathBuf>,
  /// Windows build procedure (default: build.windows_build_system, msbuild)
  #[arg(long, value_enum)]
  pub windows_build_system: Option<WindowsBuildSystem>,
  /// Print the build plan without running it
  #[arg(long)]
  pub dry_run: bool,
  /// Print the build plan as JSON without running it
  #[arg(long)]
  pub json: bool,
  /// Already running inside the build container (internal)
  #[arg(long, hide = true)]
  pub in_container: bool,
}

/// Run the build command
pub fn run_build(args: BuildArgs, global: &GlobalOptions) -> DistResult<()> {
  let root = env::current_dir()?;
  let config = DistConfig::load(&root, global.config.as_deref())?;

  let platform = match args.platform {
    Some(platform) => platform,
    None => Platform::host()?,
  };
  let arch = match args.arch {
    Some(arch) => arch,
    None => host_arch(platform)?,
  };
  let target = BuildTarget::new(platform, arch, config.icu.version.clone());

  let layout = BuildLayout::new(
    &root,
    args.work_dir.as_deref().unwrap_or(config.build.work_dir.as_path()),
    args.output_dir.as_deref().unwrap_or(config.build.output_dir.as_path()),
  );

  let jobs = config
    .build
    .jobs
    .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

  let options = PlanOptions {
    in_container: args.in_container,
    source_url: config.icu.source_url(),
    jobs,
    windows_build_system: args.windows_build_system.unwrap_or(config.build.windows_build_system),
    container: config.container.clone(),
    executable: env::current_exe()?,
    host: HostBinary::current(),
    config_path: global.config.clone(),
    verbose: global.verbose,
  };

  let plan = BuildPlan::compute(&target, &layout, &options)?;
  tracing::info!(plan = %plan.id, %target, delegated = plan.delegated, "computed build plan");

  for warning in &plan.warnings {
    eprintln!("⚠️  {}", warning);
  }

  if args.json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
    return Ok(());
  }
  if args.dry_run {
    println!("{}", plan.to_human_readable());
    println!("💡 Dry run: nothing was downloaded or built.");
    return Ok(());
  }

  println!("🔧 Building {} (plan {})", target, plan.id);
  let runner = SystemRunner::new();
  let report = PlanExecutor::new(&runner).execute(&plan)?;

  if report.delegated {
    println!("\n✅ Container build finished for {}", target);
  } else if let Some(archive) = &report.archive {
    println!(
      "\n✓ Build complete! {} ({})",
      archive.path.display(),
      format_megabytes(archive.size_bytes)
    );
  }

  Ok(())
}
