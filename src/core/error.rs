//! Error types for icu4c-dist with contextual messages and exit codes
//!
//! Every failure is terminal for the current invocation. The error carries
//! enough information for `main` to print what failed and to pick the process
//! exit status: a failing external tool propagates its own exit code, every
//! other failure maps to a fixed code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for icu4c-dist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Lookup, verification, config or usage failure
  Failure,
  /// Local I/O failure
  System,
  /// An external tool exited with this status
  Tool(i32),
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    match self {
      ExitCode::Failure => 1,
      ExitCode::System => 2,
      ExitCode::Tool(code) => code,
    }
  }
}

/// Main error type for icu4c-dist
#[derive(Debug)]
pub enum DistError {
  /// Configuration errors
  Config(ConfigError),

  /// External command errors
  Command(CommandError),

  /// Smoke-test verification errors
  Verify(VerifyError),

  /// Release publisher lookup/wait errors
  Publish(PublishError),

  /// I/O errors
  Io(io::Error),

  /// Another error with the step that hit it
  Context { context: String, source: Box<DistError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl DistError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    DistError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    DistError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// I/O errors are folded into a message. Typed errors are wrapped so they keep
  /// their exit code.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      DistError::Message { message, context, help } => DistError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      DistError::Io(err) => DistError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", err)),
        help: None,
      },
      other => DistError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      DistError::Command(e) => e.exit_code(),
      DistError::Context { source, .. } => source.exit_code(),
      DistError::Io(_) => ExitCode::System,
      DistError::Config(_) | DistError::Verify(_) | DistError::Publish(_) | DistError::Message { .. } => {
        ExitCode::Failure
      }
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      DistError::Config(e) => e.help_message(),
      DistError::Command(e) => e.help_message(),
      DistError::Verify(e) => e.help_message(),
      DistError::Publish(e) => e.help_message(),
      DistError::Context { source, .. } => source.help_message(),
      DistError::Message { help, .. } => help.clone(),
      DistError::Io(_) => None,
    }
  }
}

impl fmt::Display for DistError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DistError::Config(e) => write!(f, "{}", e),
      DistError::Command(e) => write!(f, "{}", e),
      DistError::Verify(e) => write!(f, "{}", e),
      DistError::Publish(e) => write!(f, "{}", e),
      DistError::Io(e) => write!(f, "I/O error: {}", e),
      DistError::Context { context, source } => write!(f, "{}\n{}", context, source),
      DistError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for DistError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      DistError::Io(e) => Some(e),
      DistError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for DistError {
  fn from(err: io::Error) -> Self {
    DistError::Io(err)
  }
}

impl From<String> for DistError {
  fn from(msg: String) -> Self {
    DistError::message(msg)
  }
}

impl From<&str> for DistError {
  fn from(msg: &str) -> Self {
    DistError::message(msg)
  }
}

impl From<toml_edit::de::Error> for DistError {
  fn from(err: toml_edit::de::Error) -> Self {
    DistError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for DistError {
  fn from(err: serde_json::Error) -> Self {
    DistError::message(format!("JSON error: {}", err))
  }
}

impl From<reqwest::Error> for DistError {
  fn from(err: reqwest::Error) -> Self {
    DistError::message(format!("HTTP error: {}", err))
  }
}

impl From<zip::result::ZipError> for DistError {
  fn from(err: zip::result::ZipError) -> Self {
    DistError::message(format!("Zip error: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for DistError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    DistError::message(format!("Failed to start download workers: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// An explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// A field has an unusable value
  InvalidValue { field: String, reason: String },

  /// Platform or architecture could not be resolved from the host
  UnsupportedHost { what: String, value: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Omit --config to use icu4c-dist.toml from the current directory, or built-in defaults.".to_string())
      }
      ConfigError::UnsupportedHost { what, .. } => Some(format!("Pass --{} explicitly.", what)),
      ConfigError::InvalidValue { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Config file not found: {}", path.display()),
      ConfigError::InvalidValue { field, reason } => write!(f, "Invalid value for '{}': {}", field, reason),
      ConfigError::UnsupportedHost { what, value } => {
        write!(f, "Cannot determine {} for this host ({})", what, value)
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum CommandError {
  /// Command ran and exited unsuccessfully
  Failed { command: String, code: Option<i32> },

  /// Command could not be started at all
  Spawn { program: String, reason: String },
}

impl CommandError {
  fn exit_code(&self) -> ExitCode {
    match self {
      CommandError::Failed { code: Some(code), .. } if *code != 0 => ExitCode::Tool(*code),
      _ => ExitCode::Failure,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Spawn { program, .. } => Some(format!("Make sure `{}` is installed and on PATH.", program)),
      CommandError::Failed { command, .. } if command.starts_with("gh ") => {
        Some("Check `gh auth status` and that you are inside the repository checkout.".to_string())
      }
      CommandError::Failed { .. } => None,
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Failed { command, code: Some(code) } => {
        write!(f, "Command failed with exit code {}: {}", code, command)
      }
      CommandError::Failed { command, code: None } => {
        write!(f, "Command terminated by signal: {}", command)
      }
      CommandError::Spawn { program, reason } => write!(f, "Failed to run {}: {}", program, reason),
    }
  }
}

/// Smoke-test verification errors
#[derive(Debug)]
pub enum VerifyError {
  /// Runtime reported a different major.minor version
  VersionMismatch { expected: String, detected: String },

  /// MessageFormat produced unexpected text
  MessageMismatch { expected: String, detected: String },

  /// Smoke-test output did not contain the expected lines
  MalformedOutput { output: String },
}

impl VerifyError {
  fn help_message(&self) -> Option<String> {
    match self {
      VerifyError::VersionMismatch { .. } => {
        Some("The install tree contains a different ICU than the one that was downloaded. Remove the work directory and rebuild.".to_string())
      }
      VerifyError::MessageMismatch { .. } => {
        Some("ICU loaded but could not format messages; check that the ICU data file was installed.".to_string())
      }
      VerifyError::MalformedOutput { .. } => None,
    }
  }
}

impl fmt::Display for VerifyError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VerifyError::VersionMismatch { expected, detected } => {
        write!(f, "ICU version mismatch: expected {}, detected {}", expected, detected)
      }
      VerifyError::MessageMismatch { expected, detected } => {
        write!(f, "MessageFormat mismatch: expected {:?}, got {:?}", expected, detected)
      }
      VerifyError::MalformedOutput { output } => {
        write!(f, "Smoke test produced unexpected output:\n{}", output)
      }
    }
  }
}

/// Release publisher errors
#[derive(Debug)]
pub enum PublishError {
  /// No CI run for this commit and workflow
  NoWorkflowRun { commit: String, workflow: String },

  /// Run did not finish in time
  Timeout { run_id: u64, seconds: u64 },

  /// Run finished without success
  RunFailed { run_id: u64, conclusion: Option<String> },

  /// Nothing to publish after extraction
  NoArtifacts,
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::NoWorkflowRun { .. } => Some("Push the commit and wait for CI to start, or pass a different commit.".to_string()),
      PublishError::Timeout { run_id, .. } => Some(format!("Re-run once `gh run watch {}` reports completion.", run_id)),
      PublishError::RunFailed { run_id, .. } => Some(format!("Inspect the run with `gh run view {} --log-failed`.", run_id)),
      PublishError::NoArtifacts => None,
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::NoWorkflowRun { commit, workflow } => {
        write!(f, "No workflow run found for commit {} and workflow {}", commit, workflow)
      }
      PublishError::Timeout { run_id, seconds } => {
        write!(f, "Workflow run {} did not complete within {} seconds", run_id, seconds)
      }
      PublishError::RunFailed { run_id, conclusion } => write!(
        f,
        "Workflow run {} did not succeed (conclusion: {})",
        run_id,
        conclusion.as_deref().unwrap_or("none")
      ),
      PublishError::NoArtifacts => write!(f, "No .tar.gz artifacts found after extraction"),
    }
  }
}

/// Result type alias for icu4c-dist
pub type DistResult<T> = Result<T, DistError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> DistResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<DistError>,
{
  fn with_context<F>(self, f: F) -> DistResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &DistError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
