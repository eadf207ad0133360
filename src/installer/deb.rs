//! Debian package builder.
//!
//! Computes the installed-size estimate, renders the control and
//! desktop-entry templates, then hands the staged build to the external
//! `script/mkdeb` package builder.

use crate::error::Result;
use crate::installer::{MAINTAINER, linux_context};
use crate::process;
use crate::session::BuildSession;
use crate::template;
use std::path::PathBuf;

/// Debian control-file section for the package.
const SECTION: &str = "devel";

/// Install prefix for Debian packages. Debian uses /usr/share rather than
/// /usr/local/share.
const INSTALL_DIR: &str = "/usr";

/// Installed-size fallback (KB) when the size query yields nothing.
const DEFAULT_INSTALLED_SIZE_KB: &str = "200000";

/// Build the Debian installer for the staged Linux build.
///
/// Returns the path of the produced `.deb`.
pub async fn build(session: &BuildSession) -> Result<PathBuf> {
    let manifest = &session.manifest;
    let arch = session.arch.package_arch();
    let staged = session.staged_dir();

    let installed_size = installed_size_kb(session).await;
    log::debug!("installed size estimate: {installed_size} KB");

    let mut ctx = linux_context(session);
    ctx.insert("section".into(), SECTION.to_string());
    ctx.insert("arch".into(), arch.to_string());
    ctx.insert("maintainer".into(), MAINTAINER.to_string());
    ctx.insert("installDir".into(), INSTALL_DIR.to_string());
    ctx.insert("installedSize".into(), installed_size);
    ctx.insert(
        "linuxShareDir".into(),
        format!("{INSTALL_DIR}/share/{}", manifest.name),
    );

    let linux_assets = session.resources_dir("linux");
    let control_out = template::render(session, &linux_assets.join("debian").join("control.in"), &ctx).await?;
    let desktop_out = template::render(
        session,
        &linux_assets.join(format!("{}.desktop.in", manifest.name)),
        &ctx,
    )
    .await?;
    let icon = session
        .app_dir
        .join("build")
        .join("resources")
        .join(format!("{}.png", manifest.name));

    let mkdeb = session.app_dir.join("script").join("mkdeb");
    process::run_in(
        &session.app_dir,
        &mkdeb.to_string_lossy(),
        &[
            manifest.version.clone(),
            arch.to_string(),
            control_out.to_string_lossy().into_owned(),
            desktop_out.to_string_lossy().into_owned(),
            icon.to_string_lossy().into_owned(),
            linux_assets.to_string_lossy().into_owned(),
            staged.to_string_lossy().into_owned(),
            session.output_dir.to_string_lossy().into_owned(),
        ],
    )
    .await?;

    let deb_path = session
        .output_dir
        .join(format!("{}-{}-{}.deb", manifest.name, manifest.version, arch));
    log::info!("created {}", deb_path.display());
    Ok(deb_path)
}

/// Query the staged directory's size in KB via `du -sk`, falling back to a
/// fixed default when the query fails or yields nothing. An unavailable
/// estimate is a degradation, not an error.
async fn installed_size_kb(session: &BuildSession) -> String {
    let staged = session.staged_dir();
    match process::run("du", &["-sk", &staged.to_string_lossy()]).await {
        Ok(output) => parse_installed_size(&output.stdout),
        Err(e) => {
            log::warn!("installed-size query failed ({e}), using default");
            DEFAULT_INSTALLED_SIZE_KB.to_string()
        }
    }
}

/// First whitespace-delimited token of the `du` output, or the default.
fn parse_installed_size(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or(DEFAULT_INSTALLED_SIZE_KB)
        .to_string()
}
