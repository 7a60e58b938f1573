mod build;
mod commands;
mod core;
mod publish;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use commands::{BuildArgs, GlobalOptions, PublishArgs};
use crate::core::error::{DistError, print_error};
use std::path::PathBuf;

/// Build, verify and package ICU4C, and publish the CI-built archives as a GitHub release
#[derive(Parser)]
#[command(name = "icu4c-dist")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Config file (default: icu4c-dist.toml, .icu4c-dist.toml or .config/icu4c-dist.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build ICU4C from source, verify it and package the install tree
  Build(BuildArgs),

  /// Publish a GitHub release from the CI artifacts of a commit
  Publish(PublishArgs),
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  crate::core::logging::init_logging(cli.verbose);

  let global = GlobalOptions {
    verbose: cli.verbose,
    config: cli.config,
  };

  let result = match cli.command {
    Commands::Build(args) => commands::run_build(args, &global),
    Commands::Publish(args) => commands::run_publish(args, &global),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: DistError) -> ! {
  tracing::debug!(error = ?err, "command failed");
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
