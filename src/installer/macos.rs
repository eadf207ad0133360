//! macOS installer: a zip archive of the packaged `.app` bundle.
//!
//! The archive preserves symlinks (app bundles link framework versions) and
//! unix permissions. Archiving errors abort the task.

use crate::error::{ReleaseError, Result};
use crate::session::BuildSession;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Archive the staged `.app` directory into `<output_dir>/<short>.zip`.
pub async fn build(session: &BuildSession) -> Result<PathBuf> {
    let app_path = session
        .staged_dir()
        .join(format!("{}.app", session.manifest.product_name));
    let zip_path = session
        .output_dir
        .join(format!("{}.zip", session.manifest.short_name()));

    log::info!(
        "archiving {} into {}",
        app_path.display(),
        zip_path.display()
    );

    let out = zip_path.clone();
    tokio::task::spawn_blocking(move || zip_directory(&app_path, &out))
        .await
        .map_err(|e| ReleaseError::Anyhow(anyhow::anyhow!("archive task panicked: {e}")))??;

    log::info!("created {}", zip_path.display());
    Ok(zip_path)
}

/// Write a zip of `dir`'s contents (entries relative to `dir`) to `zip_path`.
fn zip_directory(dir: &Path, zip_path: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(ReleaseError::Anyhow(anyhow::anyhow!(
            "{} is not a directory",
            dir.display()
        )));
    }
    if let Some(parent) = zip_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(zip_path)?;
    let mut writer = zip::ZipWriter::new(file);

    let mut buffer = Vec::new();
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel_path = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ReleaseError::Anyhow(anyhow::anyhow!("path outside archive root: {e}")))?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }
        let name = rel_path.to_string_lossy().replace('\\', "/");
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(entry_mode(&entry));

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            writer.add_symlink(name, target.to_string_lossy(), options)?;
        } else if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut f = std::fs::File::open(entry.path())?;
            buffer.clear();
            f.read_to_end(&mut buffer)?;
            writer.write_all(&buffer)?;
        }
    }

    writer.finish()?;
    Ok(())
}

#[cfg(unix)]
fn entry_mode(entry: &walkdir::DirEntry) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    entry
        .metadata()
        .map(|m| m.permissions().mode())
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn entry_mode(_entry: &walkdir::DirEntry) -> u32 {
    0o644
}
