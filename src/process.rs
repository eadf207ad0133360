//! Subprocess runner.
//!
//! Runs an external command to completion, capturing stdout and stderr.
//! Any non-zero exit is surfaced to the caller as an error; there are no
//! retries and no timeouts beyond what the OS provides.

use crate::error::{ReleaseError, Result};
use std::ffi::OsStr;
use std::path::Path;
use tokio::process::Command;

/// Captured output of a completed subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
}

/// Run `command` with `args`, inheriting the current working directory.
pub async fn run<S: AsRef<OsStr>>(command: &str, args: &[S]) -> Result<CommandOutput> {
    run_inner(command, args, None).await
}

/// Run `command` with `args` from the given working directory.
pub async fn run_in<S: AsRef<OsStr>>(
    dir: &Path,
    command: &str,
    args: &[S],
) -> Result<CommandOutput> {
    run_inner(command, args, Some(dir)).await
}

async fn run_inner<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    dir: Option<&Path>,
) -> Result<CommandOutput> {
    let command_line = format_command_line(command, args);
    log::debug!("running {command_line}");

    let mut cmd = Command::new(command);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.map_err(|e| ReleaseError::CommandFailed {
        command: command_line.clone(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(ReleaseError::CommandFailed {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

fn format_command_line<S: AsRef<OsStr>>(command: &str, args: &[S]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let out = run("echo", &["hello"]).await.expect("echo runs");
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let err = run("sh", &["-c", "echo nope >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            ReleaseError::CommandFailed { command, stderr } => {
                assert!(command.starts_with("sh"));
                assert!(stderr.contains("nope"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        assert!(run("mailforge-no-such-binary", &[] as &[&str]).await.is_err());
    }

    #[tokio::test]
    async fn runs_in_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = run_in(dir.path(), "pwd", &[] as &[&str]).await.expect("pwd runs");
        let got = std::fs::canonicalize(out.stdout.trim()).expect("canonicalize");
        let want = std::fs::canonicalize(dir.path()).expect("canonicalize");
        assert_eq!(got, want);
    }
}
