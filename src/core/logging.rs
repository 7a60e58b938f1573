//! Diagnostic logging setup
//!
//! User-facing progress goes to stdout/stderr directly. `tracing` carries the
//! diagnostic detail (every spawned command, config resolution, HTTP
//! transfers) and is silent unless asked for with `-v` or `RUST_LOG`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Map `-v` occurrences to a default level
pub fn level_for_verbosity(verbose: u8) -> Level {
  match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

/// Initialise the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the verbosity flag. Only the first call takes effect.
pub fn init_logging(verbose: u8) {
  let level = level_for_verbosity(verbose);
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .try_init()
    .ok();
}
