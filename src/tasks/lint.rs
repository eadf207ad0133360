//! Lint task: runs the configured style and lint checkers over the source
//! tree, for their exit codes only.

use crate::error::{ReleaseError, Result};
use crate::process;
use crate::session::BuildSession;

/// External checkers in run order. Each is independent; they share only the
/// pipeline's abort-on-failure behavior.
const LINTERS: &[(&str, &[&str])] = &[
    (
        "eslint",
        &["--config", "build/config/eslint.json", "src", "internal_packages"],
    ),
    (
        "coffeelint",
        &["--file", "build/config/coffeelint.json", "src", "internal_packages", "spec"],
    ),
    ("csslint", &["--config", "build/config/csslint.json", "static"]),
    ("lesslint", &["static", "internal_packages"]),
];

/// Run every checker in order from the application root.
pub async fn run(session: &BuildSession) -> Result<()> {
    for (tool, args) in LINTERS {
        which::which(tool).map_err(|_| ReleaseError::ToolNotFound {
            tool: tool.to_string(),
        })?;
        log::info!("linting with {tool}");
        process::run_in(&session.app_dir, tool, args).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{TargetPlatform, testutil::test_session};

    #[tokio::test]
    async fn empty_checkout_fails_lint() {
        // The checkers are either not installed or find nothing to lint;
        // both surface as a task failure.
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(TargetPlatform::Linux, dir.path().join("dist"));
        assert!(run(&session).await.is_err());
    }
}
