//! Task registry.
//!
//! Named operations compose into pipelines that run strictly in sequence,
//! aborting the remainder on the first failure. Three standing pipelines:
//! `lint`, `build`, and `ci` (build, then the installer for the current
//! platform, then publish when the run is eligible).

pub mod lint;
pub mod styles;

use crate::error::{ReleaseError, Result, required_env};
use crate::installer;
use crate::packager;
use crate::process;
use crate::publish;
use crate::session::{BuildSession, TargetPlatform};

/// A runnable unit of a pipeline.
///
/// Steps run one at a time on the invoking task, so the futures need no
/// auto-trait bounds.
#[allow(async_fn_in_trait)]
pub trait Step {
    /// Name used in pipeline logs.
    fn name(&self) -> &'static str;
    /// Run the step to completion.
    async fn run(&self, session: &BuildSession) -> Result<()>;
}

/// Every named operation the registry knows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Task {
    /// Run the configured style/lint checkers
    Lint,
    /// Compile stylesheets
    Styles,
    /// Stage the packaged application directory
    Package,
    /// Build the RPM installer
    InstallerRpm,
    /// Build the Debian installer
    InstallerDeb,
    /// Archive the macOS app bundle
    InstallerMac,
    /// Build the Windows setup executable
    InstallerWindows,
    /// Upload artifacts and notify
    Publish,
}

impl Step for Task {
    fn name(&self) -> &'static str {
        match self {
            Task::Lint => "lint",
            Task::Styles => "styles",
            Task::Package => "package",
            Task::InstallerRpm => "create-rpm-installer",
            Task::InstallerDeb => "create-deb-installer",
            Task::InstallerMac => "create-mac-installer",
            Task::InstallerWindows => "create-windows-installer",
            Task::Publish => "publish",
        }
    }

    async fn run(&self, session: &BuildSession) -> Result<()> {
        match self {
            Task::Lint => lint::run(session).await,
            Task::Styles => styles::run(session).await,
            Task::Package => packager::stage(session).await.map(|_| ()),
            Task::InstallerRpm => installer::rpm::build(session).await.map(|_| ()),
            Task::InstallerDeb => installer::deb::build(session).await.map(|_| ()),
            Task::InstallerMac => installer::macos::build(session).await.map(|_| ()),
            Task::InstallerWindows => installer::windows::build(session).await.map(|_| ()),
            Task::Publish => publish::publish(session).await,
        }
    }
}

/// Run pipeline members strictly in sequence; the first failure aborts the
/// remaining sequence and becomes the pipeline's result.
pub async fn run_pipeline<S: Step>(session: &BuildSession, steps: &[S]) -> Result<()> {
    for step in steps {
        log::info!("running task: {}", step.name());
        step.run(session).await?;
    }
    Ok(())
}

/// Resolve a task word from the command line into an ordered pipeline.
pub async fn resolve_pipeline(session: &BuildSession, name: &str) -> Result<Vec<Task>> {
    let pipeline = match name {
        "lint" => vec![Task::Lint],
        "styles" => vec![Task::Styles],
        "build" => vec![Task::Package],
        "create-rpm-installer" => vec![Task::InstallerRpm],
        "create-deb-installer" => vec![Task::InstallerDeb],
        "create-mac-installer" => vec![Task::InstallerMac],
        "create-windows-installer" => vec![Task::InstallerWindows],
        "publish" => vec![Task::Publish],
        "ci" => {
            let mut pipeline = vec![Task::Package];
            pipeline.extend(installer_tasks(session.platform));
            if publish_eligible(session).await {
                pipeline.push(Task::Publish);
            } else {
                log::info!("run is not publish-eligible, skipping publish");
            }
            pipeline
        }
        other => {
            return Err(ReleaseError::UnknownTask {
                task: other.to_string(),
            });
        }
    };
    Ok(pipeline)
}

/// Installer tasks for a platform. Linux produces both package kinds.
pub fn installer_tasks(platform: TargetPlatform) -> Vec<Task> {
    match platform {
        TargetPlatform::Linux => vec![Task::InstallerDeb, Task::InstallerRpm],
        TargetPlatform::MacOs => vec![Task::InstallerMac],
        TargetPlatform::Windows => vec![Task::InstallerWindows],
    }
}

/// Whether this run may upload artifacts: object-store credentials present
/// and the checkout is on the primary branch. A failed branch query means
/// not eligible, not an error.
pub async fn publish_eligible(session: &BuildSession) -> bool {
    if required_env("AWS_ACCESS_KEY_ID").is_err() || required_env("AWS_SECRET_ACCESS_KEY").is_err()
    {
        return false;
    }
    match process::run_in(&session.app_dir, "git", &["rev-parse", "--abbrev-ref", "HEAD"]).await {
        Ok(output) => output.stdout.trim() == "master",
        Err(_) => false,
    }
}
