//! CLI commands for icu4c-dist
//!
//! - **build**: build, verify and package ICU4C for one platform/arch pair
//! - **publish**: create a GitHub release from a commit's CI artifacts

pub mod build;
pub mod publish;

pub use build::{BuildArgs, run_build};
pub use publish::{PublishArgs, run_publish};

use std::path::PathBuf;

/// Flags accepted by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
  pub verbose: u8,
  pub config: Option<PathBuf>,
}
