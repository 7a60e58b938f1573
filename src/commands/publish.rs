//! `publish` command

use super::GlobalOptions;
use crate::core::config::DistConfig;
use crate::core::error::DistResult;
use crate::core::process::SystemRunner;
use crate::publish::{PublishRequest, Publisher};
use clap::Args;
use std::env;

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
  /// Commit the CI run was built from (`@` or `HEAD` for the current checkout)
  pub commit: String,
  /// Version for the release, e.g. 78.2
  #[arg(id = "release_version", value_name = "VERSION")]
  pub version: String,
  /// Actually create the release (default is a dry run)
  #[arg(long)]
  pub actually_publish: bool,
  /// Create the release as a draft
  #[arg(long)]
  pub draft: bool,
  /// Print the outcome as JSON
  #[arg(long)]
  pub json: bool,
}

/// Run the publish command
pub fn run_publish(args: PublishArgs, global: &GlobalOptions) -> DistResult<()> {
  let root = env::current_dir()?;
  let config = DistConfig::load(&root, global.config.as_deref())?;

  let request = PublishRequest {
    commit: args.commit,
    version: args.version,
    actually_publish: args.actually_publish,
    draft: args.draft,
  };

  let runner = SystemRunner::new();
  let publisher = Publisher::new(&runner, &config.publish);
  let outcome = {
    let mut stdout = std::io::stdout().lock();
    publisher.publish(&request, &mut stdout, args.json)?
  };

  if args.json {
    println!("{}", serde_json::to_string_pretty(&outcome)?);
  } else if outcome.published {
    println!("✓ Successfully published release for version {}", request.version);
  }

  Ok(())
}
