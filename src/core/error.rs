//! Error types for pivnet-resource with contextual messages and exit codes
//!
//! Every failure aborts the command that raised it. Errors are grouped by what
//! the caller can do about them: fix the input (validation, conflict), look at
//! the service (transport), or wait and retry the whole build (replication).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for pivnet-resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad request, invalid metadata, duplicate version)
  User = 1,
  /// System error (service, content store, I/O)
  System = 2,
  /// Reference replication failed or timed out
  Replication = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for pivnet-resource
#[derive(Debug)]
pub enum ResourceError {
  /// Bad or missing input
  Validation(ValidationError),

  /// The requested release version already exists
  Conflict { version: String },

  /// Non-success response from the service or content store
  Transport(TransportError),

  /// Image/artifact reference replication did not complete
  Replication(ReplicationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ResourceError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ResourceError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ResourceError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Shorthand for an invalid-input error
  pub fn invalid(msg: impl Into<String>) -> Self {
    ResourceError::Validation(ValidationError::Invalid { message: msg.into() })
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ResourceError::Message { message, context, help } => ResourceError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ResourceError::Io(e) => ResourceError::Message {
        message: format!("{}: {}", ctx_str, e),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ResourceError::Validation(_) => ExitCode::User,
      ResourceError::Conflict { .. } => ExitCode::User,
      ResourceError::Transport(_) => ExitCode::System,
      ResourceError::Replication(_) => ExitCode::Replication,
      ResourceError::Io(_) => ExitCode::System,
      ResourceError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ResourceError::Validation(e) => e.help_message(),
      ResourceError::Conflict { .. } => {
        Some("Bump the version in the metadata or version file; existing releases are never overwritten.".to_string())
      }
      ResourceError::Transport(e) => e.help_message(),
      ResourceError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ResourceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResourceError::Validation(e) => write!(f, "{}", e),
      ResourceError::Conflict { version } => write!(f, "release already exists with version: {}", version),
      ResourceError::Transport(e) => write!(f, "{}", e),
      ResourceError::Replication(e) => write!(f, "{}", e),
      ResourceError::Io(e) => write!(f, "I/O error: {}", e),
      ResourceError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ResourceError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ResourceError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ResourceError {
  fn from(err: io::Error) -> Self {
    ResourceError::Io(err)
  }
}

impl From<String> for ResourceError {
  fn from(msg: String) -> Self {
    ResourceError::message(msg)
  }
}

impl From<&str> for ResourceError {
  fn from(msg: &str) -> Self {
    ResourceError::message(msg)
  }
}

impl From<ValidationError> for ResourceError {
  fn from(err: ValidationError) -> Self {
    ResourceError::Validation(err)
  }
}

impl From<TransportError> for ResourceError {
  fn from(err: TransportError) -> Self {
    ResourceError::Transport(err)
  }
}

impl From<ReplicationError> for ResourceError {
  fn from(err: ReplicationError) -> Self {
    ResourceError::Replication(err)
  }
}

impl From<std::num::ParseIntError> for ResourceError {
  fn from(err: std::num::ParseIntError) -> Self {
    ResourceError::invalid(format!("Parse error: {}", err))
  }
}

impl From<serde_json::Error> for ResourceError {
  fn from(err: serde_json::Error) -> Self {
    ResourceError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for ResourceError {
  fn from(err: serde_yaml::Error) -> Self {
    ResourceError::message(format!("YAML error: {}", err))
  }
}

impl From<regex::Error> for ResourceError {
  fn from(err: regex::Error) -> Self {
    ResourceError::invalid(format!("Invalid version pattern: {}", err))
  }
}

impl From<glob::PatternError> for ResourceError {
  fn from(err: glob::PatternError) -> Self {
    ResourceError::invalid(format!("Invalid glob: {}", err))
  }
}

impl From<reqwest::Error> for ResourceError {
  fn from(err: reqwest::Error) -> Self {
    match err.status() {
      Some(status) => ResourceError::Transport(TransportError::Status {
        method: String::new(),
        url: err.url().map(|u| u.to_string()).unwrap_or_default(),
        expected: 200,
        actual: status.as_u16(),
        message: err.to_string(),
      }),
      None => ResourceError::Transport(TransportError::Request {
        url: err.url().map(|u| u.to_string()).unwrap_or_default(),
        reason: err.to_string(),
      }),
    }
  }
}

impl From<s3::error::S3Error> for ResourceError {
  fn from(err: s3::error::S3Error) -> Self {
    ResourceError::Transport(TransportError::Request {
      url: "s3".to_string(),
      reason: err.to_string(),
    })
  }
}

/// Input validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Required request field not supplied
  MissingField { field: String },

  /// Value is not in the set the service accepts
  NotOneOf {
    field: String,
    value: String,
    allowed: Vec<String>,
  },

  /// Declared product files that no glob matched
  UnmatchedProductFiles { files: Vec<String> },

  /// Required file not present on disk
  FileNotFound { path: PathBuf },

  /// Anything else wrong with the request or metadata
  Invalid { message: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::MissingField { field } => Some(format!("Set `{}` in the resource source or put params.", field)),
      ValidationError::UnmatchedProductFiles { .. } => {
        Some("Every `product_files[].file` in the metadata must be matched by `file_glob`.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::MissingField { field } => write!(f, "{} must be provided", field),
      ValidationError::NotOneOf { field, value, allowed } => {
        let quoted: Vec<String> = allowed.iter().map(|a| format!("'{}'", a)).collect();
        write!(f, "provided {}: '{}' must be one of: [{}]", field, value, quoted.join(", "))
      }
      ValidationError::UnmatchedProductFiles { files } => {
        write!(
          f,
          "product files were provided in metadata that match no globs: {}",
          files.join(", ")
        )
      }
      ValidationError::FileNotFound { path } => write!(f, "file not found: {}", path.display()),
      ValidationError::Invalid { message } => write!(f, "{}", message),
    }
  }
}

/// Service and content-store transport errors
#[derive(Debug)]
pub enum TransportError {
  /// Response arrived with an unexpected status code
  Status {
    method: String,
    url: String,
    expected: u16,
    actual: u16,
    message: String,
  },

  /// Request never produced a response
  Request { url: String, reason: String },
}

impl TransportError {
  fn help_message(&self) -> Option<String> {
    match self {
      TransportError::Status { actual: 401, .. } | TransportError::Status { actual: 403, .. } => {
        Some("Check that `api_token` is valid and has access to the product.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for TransportError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TransportError::Status {
        method,
        url,
        expected,
        actual,
        message,
      } => {
        write!(
          f,
          "{} {} returned status code: {} - expected: {}",
          method, url, actual, expected
        )?;
        if !message.is_empty() {
          write!(f, "\n{}", message)?;
        }
        Ok(())
      }
      TransportError::Request { url, reason } => write!(f, "request to {} failed: {}", url, reason),
    }
  }
}

/// Reference replication errors
#[derive(Debug)]
pub enum ReplicationError {
  /// Service reported a terminal replication failure
  Failed { kind: String, name: String },

  /// Replication did not complete before the deadline
  TimedOut { kind: String, name: String },
}

impl fmt::Display for ReplicationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReplicationError::Failed { kind, name } => {
        write!(f, "{} reference with name {} failed to replicate", kind, name)
      }
      ReplicationError::TimedOut { kind, name } => {
        write!(f, "timed out replicating {} reference with name: {}", kind, name)
      }
    }
  }
}

/// Result type alias for pivnet-resource
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ResourceResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ResourceResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ResourceError>,
{
  fn context(self, ctx: impl Into<String>) -> ResourceResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ResourceResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr with help text
pub fn print_error(error: &ResourceError) {
  eprintln!("\nerror: {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("help: {}\n", help);
  }
}
