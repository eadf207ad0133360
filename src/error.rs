//! Error types for release-pipeline operations.
//!
//! Configuration errors (missing environment variables, unsupported
//! architectures) are fatal and abort immediately. Subprocess and upload
//! failures propagate to the invoking task, which aborts its pipeline.
//! Nothing in here retries.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release-pipeline operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Application manifest read/parse errors
    #[error("manifest error at {path}: {reason}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// JSON errors (manifest, webhook payloads)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template render errors, including a referenced-but-missing key
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Required environment variable absent or empty
    #[error("please set the {var} environment variable")]
    MissingEnv {
        /// Variable name
        var: String,
    },

    /// Host architecture outside the supported set
    #[error("unsupported architecture: {arch}")]
    UnsupportedArch {
        /// Architecture identifier as detected or passed
        arch: String,
    },

    /// Host platform outside the supported set
    #[error("unsupported platform: {platform}")]
    UnsupportedPlatform {
        /// Platform identifier as detected or passed
        platform: String,
    },

    /// External tool not found on PATH
    #[error("required tool not found: {tool}")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },

    /// Non-zero exit from an external tool
    #[error("command failed: {command}{}", format_stderr(.stderr))]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Captured standard error, if any
        stderr: String,
    },

    /// Unknown task name passed on the command line
    #[error("unknown task: {task}")]
    UnknownTask {
        /// Task name as passed
        task: String,
    },

    /// Archive creation errors
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Artifact upload failures
    #[error("upload of {key} failed: {reason}")]
    Upload {
        /// Destination key
        key: String,
        /// Reason for the error
        reason: String,
    },

    /// Webhook notification failures
    #[error("notification failed: {0}")]
    Notify(#[from] reqwest::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

/// Read a required environment variable, failing if it is absent or empty.
pub fn required_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ReleaseError::MissingEnv {
            var: var.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_is_an_error() {
        let err = required_env("MAILFORGE_TEST_NOT_SET").unwrap_err();
        assert!(matches!(err, ReleaseError::MissingEnv { .. }));
    }

    #[test]
    fn command_failed_includes_stderr() {
        let err = ReleaseError::CommandFailed {
            command: "script/mkdeb".into(),
            stderr: "dpkg-deb: boom".into(),
        };
        let text = err.to_string();
        assert!(text.contains("script/mkdeb"));
        assert!(text.contains("dpkg-deb: boom"));
    }
}
