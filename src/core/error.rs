//! Error types for ckrail with contextual messages and exit codes
//!
//! Every fatal condition of a run (missing environment, malformed manifest,
//! exhausted retries, failed external tool) maps onto one `RailError`
//! variant. `main` prints it with `print_error` and exits with the variant's
//! exit code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for ckrail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, manifest, invalid args)
  User = 1,
  /// System error (git, packaging CLI, I/O, exhausted retries)
  System = 2,
  /// Validation failure (batch items failed under --strict)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for ckrail
#[derive(Debug)]
pub enum RailError {
  /// Environment configuration errors
  Config(ConfigError),

  /// Manifest / resource-spec errors
  Manifest(ManifestError),

  /// Git operation errors
  Git(GitError),

  /// External tool (charm, docker, bash) errors
  Tool(ToolError),

  /// A retried operation failed on every attempt
  RetryExhausted {
    operation: String,
    attempts: u32,
    last_error: Box<RailError>,
  },

  /// Batch completed with failed items
  BatchFailed { failed: usize, total: usize },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::User,
      RailError::Manifest(_) => ExitCode::User,
      RailError::Git(_) => ExitCode::System,
      RailError::Tool(_) => ExitCode::System,
      RailError::RetryExhausted { .. } => ExitCode::System,
      RailError::BatchFailed { .. } => ExitCode::Validation,
      RailError::Io(_) => ExitCode::System,
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Manifest(e) => e.help_message(),
      RailError::Git(e) => e.help_message(),
      RailError::RetryExhausted { .. } => {
        Some("Check network access to the layer index / charm store and rerun.".to_string())
      }
      RailError::BatchFailed { .. } => Some("Inspect the per-item log lines above (or rerun with --json).".to_string()),
      RailError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Manifest(e) => write!(f, "{}", e),
      RailError::Git(e) => write!(f, "{}", e),
      RailError::Tool(e) => write!(f, "{}", e),
      RailError::RetryExhausted {
        operation,
        attempts,
        last_error,
      } => write!(
        f,
        "{} failed after {} attempt(s), giving up\nlast error: {}",
        operation, attempts, last_error
      ),
      RailError::BatchFailed { failed, total } => write!(f, "{} of {} item(s) failed", failed, total),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      RailError::RetryExhausted { last_error, .. } => Some(last_error.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for RailError {
  fn from(err: serde_yaml::Error) -> Self {
    RailError::message(format!("YAML error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RailError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RailError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Environment configuration errors
#[derive(Debug)]
pub enum ConfigError {
  /// One or more required environment variables are unset or empty
  MissingEnv { names: Vec<String> },

  /// A value could not be used
  Invalid { name: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::MissingEnv { .. } => Some(
        "Export CHARM_BUILD_DIR, CHARM_LAYERS_DIR, CHARM_INTERFACES_DIR and WORKSPACE before running charm commands."
          .to_string(),
      ),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::MissingEnv { names } => {
        write!(
          f,
          "Unable to find some or all of these environment variables: {}",
          names.join(", ")
        )
      }
      ConfigError::Invalid { name, reason } => write!(f, "Invalid value for {}: {}", name, reason),
    }
  }
}

/// Manifest and resource-spec errors
#[derive(Debug)]
pub enum ManifestError {
  /// File could not be read or parsed
  Parse { path: PathBuf, reason: String },

  /// A list item was not a single-key mapping
  NotSingleKey { path: PathBuf, index: usize, keys: usize },

  /// A required field is missing for this manifest kind
  MissingField {
    path: PathBuf,
    entry: String,
    field: &'static str,
  },

  /// Layer list entry is neither `layer:` nor `interface:`
  UnknownCategory { entry: String },

  /// No resource-spec fragment for the entity
  NoResourceSpec { entity: String },
}

impl ManifestError {
  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::NotSingleKey { .. } => {
        Some("Each manifest item must look like `- name: { namespace: ..., downstream: ... }`.".to_string())
      }
      ManifestError::UnknownCategory { .. } => {
        Some("Layer list keys must be prefixed with `layer:` or `interface:`.".to_string())
      }
      ManifestError::NoResourceSpec { entity } => Some(format!("Add an entry for '{}' to the resource spec.", entity)),
      _ => None,
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::Parse { path, reason } => write!(f, "Failed to load {}: {}", path.display(), reason),
      ManifestError::NotSingleKey { path, index, keys } => write!(
        f,
        "{}: item #{} must be a mapping with exactly one key (found {})",
        path.display(),
        index,
        keys
      ),
      ManifestError::MissingField { path, entry, field } => {
        write!(f, "{}: entry '{}' is missing required field '{}'", path.display(), entry, field)
      }
      ManifestError::UnknownCategory { entry } => write!(f, "Unknown layer/interface: {}", entry),
      ManifestError::NoResourceSpec { entity } => {
        write!(f, "Unable to determine resource spec for entity '{}'", entity)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Clone failed
  CloneFailed { url: String, stderr: String },

  /// Merge failed (usually a conflict)
  MergeFailed { target: String, source: String, stderr: String },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have; rerun after the remote settles.".to_string())
        } else if reason.contains("Authentication failed") || reason.contains("403") {
          Some("Check CDKBOT_GH_USR / CDKBOT_GH_PSW.".to_string())
        } else {
          None
        }
      }
      GitError::MergeFailed { .. } => Some("Resolve the conflict by hand in the downstream repository.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim())
      }
      GitError::CloneFailed { url, stderr } => write!(f, "Failed to clone {}: {}", url, stderr.trim()),
      GitError::MergeFailed { target, source, stderr } => {
        write!(f, "Merging {} into {} failed: {}", source, target, stderr.trim())
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason.trim())
      }
    }
  }
}

/// Failure of an external (non-git) tool
#[derive(Debug)]
pub struct ToolError {
  /// Rendered command line
  pub command: String,
  /// Exit status, `None` when killed by a signal
  pub status: Option<i32>,
  pub stderr: String,
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(code) => write!(f, "`{}` exited with status {}", self.command, code)?,
      None => write!(f, "`{}` was terminated by a signal", self.command)?,
    }
    let stderr = self.stderr.trim();
    if !stderr.is_empty() {
      write!(f, "\n{}", stderr)?;
    }
    Ok(())
  }
}

/// Result type alias for ckrail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
