//! Post-copy hooks run after the packager stages files.
//!
//! Hooks execute strictly in sequence; the compile pass must see
//! fully-resolved, non-symlinked sources, so ordering is load-bearing.

use crate::error::Result;
use crate::process;
use crate::session::{BuildSession, TargetPlatform};
use std::io;
use std::path::Path;

/// Directories whose entries may be symlinks to local development checkouts.
/// Symlinks do not survive archival, so staged entries are resolved into
/// real copies.
const LINK_ROOTS: &[&str] = &["internal_packages", "node_modules"];

/// A unit of work run against the staged build directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PostCopyHook {
    /// Place platform-specific side files beside (not inside) the staged app
    PlatformSideFiles,
    /// Replace symlinked local packages with real on-disk copies
    ResolveSymlinks,
    /// Ahead-of-time compile pass persisting its cache into the staged build
    CompileCache,
}

impl PostCopyHook {
    /// Hook name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::PlatformSideFiles => "platform-side-files",
            Self::ResolveSymlinks => "resolve-symlinks",
            Self::CompileCache => "compile-cache",
        }
    }

    /// Run the hook to completion.
    pub async fn run(self, session: &BuildSession, staged: &Path) -> Result<()> {
        match self {
            Self::PlatformSideFiles => place_side_files(session, staged).await,
            Self::ResolveSymlinks => resolve_symlinks(staged).await,
            Self::CompileCache => compile_cache(session, staged).await,
        }
    }
}

/// The standing hook order. Symlink resolution runs before the compile pass
/// so compilation never reads through a link.
pub fn default_hooks() -> Vec<PostCopyHook> {
    vec![
        PostCopyHook::PlatformSideFiles,
        PostCopyHook::ResolveSymlinks,
        PostCopyHook::CompileCache,
    ]
}

/// Copy Windows-only resource files (setup icon, loading animation) next to
/// the staged app directory, where the installer generator expects them.
/// A no-op on other platforms.
async fn place_side_files(session: &BuildSession, staged: &Path) -> Result<()> {
    if session.platform != TargetPlatform::Windows {
        return Ok(());
    }
    let win_resources = session.resources_dir("win");
    if !win_resources.exists() {
        log::debug!("no Windows resources at {}", win_resources.display());
        return Ok(());
    }
    let beside = staged.parent().unwrap_or(staged).to_path_buf();
    let mut entries = tokio::fs::read_dir(&win_resources).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            let dest = beside.join(entry.file_name());
            log::debug!("placing side file {}", dest.display());
            tokio::fs::copy(entry.path(), dest).await?;
        }
    }
    Ok(())
}

/// Replace symlinked entries under the staged link roots with real copies of
/// their targets.
pub(crate) async fn resolve_symlinks(staged: &Path) -> Result<()> {
    for root in LINK_ROOTS {
        let dir = staged.join(root);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = tokio::fs::symlink_metadata(&path).await?;
            if !meta.file_type().is_symlink() {
                continue;
            }
            let real = tokio::fs::canonicalize(&path).await?;
            log::info!("copying {} to {}", real.display(), path.display());
            tokio::fs::remove_file(&path).await?;
            if real.is_dir() {
                crate::packager::copy_tree(&real, &path, false).await?;
            } else {
                tokio::fs::copy(&real, &path).await?;
            }
        }
    }
    Ok(())
}

/// Run the ahead-of-time compile pass over the staged source and resource
/// trees, persisting its cache so the shipped app never compiles at runtime.
async fn compile_cache(session: &BuildSession, staged: &Path) -> Result<()> {
    let cache_dir = staged.join(".cache");
    tokio::fs::create_dir_all(&cache_dir).await?;

    let compiler = session.app_dir.join("script").join("compile-cache");
    let staged_arg = staged.to_string_lossy().into_owned();
    let cache_arg = cache_dir.to_string_lossy().into_owned();
    process::run_in(
        &session.app_dir,
        &compiler.to_string_lossy(),
        &[staged_arg, cache_arg],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_run_compile_after_symlink_resolution() {
        let hooks = default_hooks();
        let resolve = hooks
            .iter()
            .position(|h| *h == PostCopyHook::ResolveSymlinks)
            .expect("resolve hook registered");
        let compile = hooks
            .iter()
            .position(|h| *h == PostCopyHook::CompileCache)
            .expect("compile hook registered");
        assert!(resolve < compile);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolves_linked_packages_into_real_copies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("checkout").join("composer");
        std::fs::create_dir_all(real.join("lib")).expect("mkdir");
        std::fs::write(real.join("lib/main.js"), "module").expect("write");

        let staged = dir.path().join("staged");
        let packages = staged.join("internal_packages");
        std::fs::create_dir_all(&packages).expect("mkdir");
        std::os::unix::fs::symlink(&real, packages.join("composer")).expect("symlink");

        resolve_symlinks(&staged).await.expect("resolves");

        let entry = packages.join("composer");
        let meta = std::fs::symlink_metadata(&entry).expect("metadata");
        assert!(!meta.file_type().is_symlink(), "entry must be a real copy");
        assert!(entry.join("lib/main.js").exists());
    }

    #[tokio::test]
    async fn resolve_is_a_noop_without_link_roots() {
        let dir = tempfile::tempdir().expect("tempdir");
        resolve_symlinks(dir.path()).await.expect("no-op succeeds");
    }
}
