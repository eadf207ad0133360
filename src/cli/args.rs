//! Command line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Release pipeline for the MailForge desktop email client
#[derive(Parser, Debug)]
#[command(
    name = "mailforge-release",
    version,
    about = "Release pipeline for the MailForge desktop email client",
    long_about = "Runs named release tasks against an application checkout.

Standing pipelines:
  lint     run the style/lint checkers
  build    stage the packaged application directory
  ci       build, create the installer for this platform, and publish
           (publishing requires the primary branch and S3 credentials)

Individual tasks (styles, create-deb-installer, create-rpm-installer,
create-mac-installer, create-windows-installer, publish) run alone.

Usage:
  mailforge-release build --app-dir ~/src/mailforge
  mailforge-release lint build
  mailforge-release ci --target-arch x64"
)]
pub struct Args {
    /// Task names to run, in order
    #[arg(value_name = "TASK", required = true)]
    pub tasks: Vec<String>,

    /// Root of the application checkout
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub app_dir: PathBuf,

    /// Directory for staged builds and artifacts (default: <app-dir>/dist)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Target platform (linux, darwin, win32); default: host platform
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Target architecture (ia32, x64); default: host architecture
    #[arg(long = "target-arch", value_name = "ARCH")]
    pub target_arch: Option<String>,
}

impl Args {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tasks_and_options() {
        let args = Args::parse_from([
            "mailforge-release",
            "lint",
            "build",
            "--app-dir",
            "/src/mailforge",
            "--target-arch",
            "x64",
        ]);
        assert_eq!(args.tasks, vec!["lint", "build"]);
        assert_eq!(args.app_dir, PathBuf::from("/src/mailforge"));
        assert_eq!(args.target_arch.as_deref(), Some("x64"));
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn requires_at_least_one_task() {
        assert!(Args::try_parse_from(["mailforge-release"]).is_err());
    }
}
