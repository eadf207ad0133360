//! RPM package builder.
//!
//! Renders the spec and desktop-entry templates, then hands the staged
//! build to the external `script/mkrpm` package builder.

use crate::error::Result;
use crate::installer::linux_context;
use crate::process;
use crate::session::BuildSession;
use crate::template;
use std::io;
use std::path::PathBuf;

/// Install prefix baked into the spec template.
const LINUX_BIN_DIR: &str = "/usr/local/bin";

/// Build the RPM installer for the staged Linux build.
///
/// Returns the directory the package builder wrote into.
pub async fn build(session: &BuildSession) -> Result<PathBuf> {
    let name = &session.manifest.name;

    // Stale output from an earlier run confuses rpmbuild.
    let rpm_dir = session.output_dir.join("rpm");
    match tokio::fs::remove_dir_all(&rpm_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut ctx = linux_context(session);
    ctx.insert("linuxBinDir".into(), LINUX_BIN_DIR.to_string());
    ctx.insert("linuxShareDir".into(), format!("/usr/local/share/{name}"));

    let linux_assets = session.resources_dir("linux");
    let spec_in = linux_assets.join("redhat").join(format!("{name}.spec.in"));
    let spec_out = session.output_dir.join(format!("{name}.spec"));
    template::render_to(&spec_in, &ctx, &spec_out).await?;

    let desktop_in = linux_assets.join(format!("{name}.desktop.in"));
    let desktop_out = session.output_dir.join(format!("{name}.desktop"));
    template::render_to(&desktop_in, &ctx, &desktop_out).await?;

    let staged = session.staged_dir();
    let mkrpm = session.app_dir.join("script").join("mkrpm");
    process::run_in(
        &session.app_dir,
        &mkrpm.to_string_lossy(),
        &[
            spec_out.to_string_lossy().into_owned(),
            desktop_out.to_string_lossy().into_owned(),
            session.output_dir.to_string_lossy().into_owned(),
            staged.to_string_lossy().into_owned(),
            name.clone(),
        ],
    )
    .await?;

    log::info!("created rpm package in {}", rpm_dir.display());
    Ok(rpm_dir)
}
