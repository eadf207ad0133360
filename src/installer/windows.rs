//! Windows installer builder.
//!
//! Renders the setup script from an embedded template and delegates to the
//! external installer generator (`makensis`), then signs the result with the
//! certificate configured in the environment. Both credential variables are
//! required: a missing one is a fatal configuration error.

use crate::error::{ReleaseError, Result, required_env};
use crate::session::BuildSession;
use crate::template::{TemplateContext, render_str};
use crate::process;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Environment variable naming the code-signing certificate file.
pub const CERTIFICATE_FILE_VAR: &str = "CERTIFICATE_FILE";
/// Environment variable holding the certificate password.
pub const CERTIFICATE_PASSWORD_VAR: &str = "WINDOWS_CODESIGN_KEY_PASSWORD";

/// Setup-script template. Rendered with product metadata, the staged build
/// directory, and branding assets placed by the side-file hook.
const SETUP_TEMPLATE: &str = r#"Unicode true
Name "{{product_name}}"
OutFile "{{output_file}}"
InstallDir "$LOCALAPPDATA\\{{product_name}}"
Icon "{{setup_icon}}"
BrandingText "{{description}}"
VIProductVersion "{{version_windows}}"
VIAddVersionKey "ProductName" "{{product_name}}"
VIAddVersionKey "CompanyName" "{{authors}}"
VIAddVersionKey "FileDescription" "{{description}}"
VIAddVersionKey "FileVersion" "{{version}}"
SetCompressor /SOLID lzma
SilentInstall normal
SplashImage "{{loading_gif}}"

Section "Install"
  SetOutPath "$INSTDIR"
  File /r "{{app_directory}}\*"
  CreateShortcut "$SMPROGRAMS\\{{product_name}}.lnk" "$INSTDIR\\{{exe}}"
  WriteUninstaller "$INSTDIR\Uninstall.exe"
SectionEnd

Section "Uninstall"
  Delete "$SMPROGRAMS\\{{product_name}}.lnk"
  RMDir /r "$INSTDIR"
SectionEnd
"#;

/// Build and sign the Windows setup executable.
///
/// Produces `<output_dir>/installer/<Product>Setup.exe` alongside the
/// generator's RELEASES and delta-package files.
pub async fn build(session: &BuildSession) -> Result<PathBuf> {
    let certificate_file = required_env(CERTIFICATE_FILE_VAR)?;
    let certificate_password = required_env(CERTIFICATE_PASSWORD_VAR)?;

    let makensis = which::which("makensis").map_err(|_| ReleaseError::ToolNotFound {
        tool: "makensis".to_string(),
    })?;

    let installer_dir = session.installer_dir();
    tokio::fs::create_dir_all(&installer_dir).await?;

    let setup_path = installer_dir.join(format!("{}Setup.exe", session.manifest.product_name));
    let script = render_str(SETUP_TEMPLATE, &setup_context(session, &setup_path)?)?;

    // The generator requires scripts encoded with a UTF-8 BOM.
    let script_path = installer_dir.join("setup.nsi");
    write_utf8_bom(&script_path, &script).await?;

    process::run_in(
        &session.app_dir,
        &makensis.to_string_lossy(),
        &[
            "-V3".to_string(),
            "-INPUTCHARSET".to_string(),
            "UTF8".to_string(),
            script_path.to_string_lossy().into_owned(),
        ],
    )
    .await?;

    sign(&setup_path, &certificate_file, &certificate_password).await?;

    log::info!("created {}", setup_path.display());
    Ok(setup_path)
}

fn setup_context(session: &BuildSession, setup_path: &Path) -> Result<TemplateContext> {
    let manifest = &session.manifest;
    let win_resources = session.resources_dir("win");

    let mut ctx = TemplateContext::new();
    ctx.insert("product_name".into(), manifest.product_name.clone());
    ctx.insert("version".into(), manifest.version.clone());
    ctx.insert(
        "version_windows".into(),
        windows_version(&manifest.version),
    );
    ctx.insert("description".into(), manifest.description.clone());
    ctx.insert("authors".into(), "MailForge Team".into());
    ctx.insert("exe".into(), manifest.exe_name());
    ctx.insert(
        "app_directory".into(),
        session.staged_dir().to_string_lossy().into_owned(),
    );
    ctx.insert(
        "output_file".into(),
        setup_path.to_string_lossy().into_owned(),
    );
    ctx.insert(
        "setup_icon".into(),
        win_resources
            .join(format!("{}.ico", manifest.name))
            .to_string_lossy()
            .into_owned(),
    );
    ctx.insert(
        "loading_gif".into(),
        win_resources.join("loading.gif").to_string_lossy().into_owned(),
    );
    Ok(ctx)
}

/// Version string for the installer's VIProductVersion field, which requires
/// exactly four numeric parts. Pre-release qualifiers are dropped.
fn windows_version(version: &str) -> String {
    let numeric = version.split('-').next().unwrap_or(version);
    let parts: Vec<&str> = numeric.split('.').collect();
    match parts.len() {
        1 => format!("{}.0.0.0", parts[0]),
        2 => format!("{}.{}.0.0", parts[0], parts[1]),
        3 => format!("{}.{}.{}.0", parts[0], parts[1], parts[2]),
        _ => format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3]),
    }
}

/// Write a file prefixed with the UTF-8 byte order mark.
async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&[0xEF, 0xBB, 0xBF]).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

async fn sign(setup_path: &Path, certificate_file: &str, password: &str) -> Result<()> {
    process::run(
        "signtool",
        &[
            "sign",
            "/f",
            certificate_file,
            "/p",
            password,
            "/tr",
            "http://timestamp.digicert.com",
            "/td",
            "sha256",
            &setup_path.to_string_lossy(),
        ],
    )
    .await?;
    Ok(())
}
