//! Error types for setup and run failures.
//!
//! Only conditions that abort a run live here. Per-file and per-rule problems
//! never surface as `Error`; they are recorded as findings so the report still
//! prints.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conformist operations
#[derive(Debug, Error)]
pub enum Error {
    /// The scan root does not exist
    #[error("root path not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    /// The scan root exists but cannot be listed
    #[error("root path not readable: {}: {message}", path.display())]
    RootNotReadable { path: PathBuf, message: String },

    /// Configuration file problems
    #[error("configuration error{}: {message}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Rule catalog problems (unreadable file, invariant violations)
    #[error("catalog error{}: {message}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Catalog {
        message: String,
        path: Option<PathBuf>,
    },

    /// Glob or regex that failed to compile
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The run was cancelled before all files were scheduled
    #[error("run cancelled")]
    Cancelled,

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// YAML errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    pub fn config_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
            path: None,
        }
    }

    pub fn catalog_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Catalog {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a setup failure (bad root, config or catalog).
    pub fn is_setup_error(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Process exit code for a run that ended in this error. A cancelled run
    /// never proves compliance, so it exits as a failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_setup_error() {
            3
        } else {
            1
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_mentions_path_when_present() {
        let err = Error::config_at("bad value", "/tmp/.conformist.toml");
        let text = err.to_string();
        assert!(text.contains("/tmp/.conformist.toml"));
        assert!(text.contains("bad value"));
    }

    #[test]
    fn catalog_error_without_path_is_plain() {
        let err = Error::catalog("duplicate rule id 'x'");
        assert_eq!(err.to_string(), "catalog error: duplicate rule id 'x'");
    }

    #[test]
    fn cancellation_is_not_a_setup_error() {
        assert!(!Error::Cancelled.is_setup_error());
        assert!(Error::RootNotFound { path: "x".into() }.is_setup_error());
    }

    #[test]
    fn setup_errors_exit_with_three() {
        assert_eq!(Error::config("bad").exit_code(), 3);
        assert_eq!(Error::invalid_pattern("[", "unclosed").exit_code(), 3);
        assert_eq!(Error::Cancelled.exit_code(), 1);
    }
}
