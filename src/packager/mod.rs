//! Packager adapter.
//!
//! Stages a self-contained, platform-specific copy of the application tree
//! into the output directory, excluding everything the shipped app never
//! needs, then runs the ordered post-copy hooks. The staged directory is
//! what the installer builders wrap.

pub mod hooks;

use crate::error::{ReleaseError, Result};
use crate::session::BuildSession;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Paths matching any of these patterns (relative to the application root,
/// `/`-separated) are excluded from the staged build: source-control
/// metadata, build tooling, documentation, native build intermediates, and
/// vendored test/benchmark trees.
const IGNORE_PATTERNS: &[&str] = &[
    // top level dirs we never want
    r"^\.git(/|$)",
    r"^build(/|$)",
    r"^dist(/|$)",
    r"^docs(/|$)",
    r"^script(/|$)",
    r"^spec(/|$)",
    r"^flow-typed(/|$)",
    // general dirs we never want
    r"(^|/)gh-pages$",
    r"(^|/)obj/gen(/|$)",
    r"(^|/)\.deps$",
    r"(^|/)coverage(/|$)",
    // specific files we never want
    r"\.DS_Store$",
    r"\.npmignore$",
    r"\.travis\.yml$",
    r"appveyor\.yml$",
    r"\.editorconfig$",
    r"\.eslintrc$",
    r"\.flowconfig$",
    r"\.gitattributes$",
    r"\.gitkeep$",
    r"\.pdb$",
    r"\.cc$",
    r"\.h$",
    r"\.d\.ts$",
    r"\.js\.flow$",
    r"\.map$",
    r"binding\.gyp$",
    r"target\.mk$",
    // module bits we know we don't need
    r"node_modules/[^/]+/tests?(/|$)",
    r"node_modules/[^/]+/coverage(/|$)",
    r"node_modules/[^/]+/benchmark(/|$)",
    r"node_modules/less/dist(/|$)",
    r"node_modules/react/dist(/|$)",
];

static IGNORE_SET: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    IGNORE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("ignore pattern compiles"))
        .collect()
});

/// True when a root-relative path should be excluded from the staged build.
pub fn is_ignored(rel_path: &str) -> bool {
    IGNORE_SET.iter().any(|re| re.is_match(rel_path))
}

/// Stage the packaged application directory and run post-copy hooks.
///
/// Produces `<output_dir>/<name>-<platform>-<arch>` ready for installer
/// wrapping. Hooks run strictly in sequence: later hooks depend on earlier
/// ones having completed.
pub async fn stage(session: &BuildSession) -> Result<PathBuf> {
    let staged = session.staged_dir();
    log::info!(
        "staging {} into {}",
        session.app_dir.display(),
        staged.display()
    );

    match tokio::fs::remove_dir_all(&staged).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    copy_tree(&session.app_dir, &staged, true).await?;

    for hook in hooks::default_hooks() {
        log::info!("running post-copy hook: {}", hook.name());
        hook.run(session, &staged).await?;
    }

    Ok(staged)
}

/// Recursively copy a directory tree, preserving symlinks.
///
/// When `filtered` is set, root-relative paths matching the ignore set are
/// skipped. The walk and copy run on the blocking pool.
pub async fn copy_tree(from: &Path, to: &Path, filtered: bool) -> Result<()> {
    let from = from.to_path_buf();
    let to = to.to_path_buf();
    tokio::task::spawn_blocking(move || copy_tree_blocking(&from, &to, filtered))
        .await
        .map_err(|e| ReleaseError::Anyhow(anyhow::anyhow!("copy task panicked: {e}")))??;
    Ok(())
}

fn copy_tree_blocking(from: &Path, to: &Path, filtered: bool) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut walker = walkdir::WalkDir::new(from).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(io::Error::from)?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| ReleaseError::Anyhow(anyhow::anyhow!("path outside stage root: {e}")))?;

        if filtered {
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");
            if !rel_str.is_empty() && is_ignored(&rel_str) {
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }
        }

        let dest_path = to.join(rel_path);
        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            symlink_any(&target, &dest_path, entry.path())?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_any(target: &Path, dest: &Path, _original: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn symlink_any(target: &Path, dest: &Path, original: &Path) -> io::Result<()> {
    if original.is_dir() {
        std::os::windows::fs::symlink_dir(target, dest)
    } else {
        std::os::windows::fs::symlink_file(target, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_scm_and_build_tooling() {
        assert!(is_ignored(".git/config"));
        assert!(is_ignored("build/Gruntfile.js"));
        assert!(is_ignored("script/mkdeb"));
        assert!(is_ignored("docs/index.md"));
    }

    #[test]
    fn excludes_native_intermediates_and_vendored_tests() {
        assert!(is_ignored("src/native/binding.gyp"));
        assert!(is_ignored("src/native/parser.cc"));
        assert!(is_ignored("node_modules/left-pad/test"));
        assert!(is_ignored("node_modules/react/dist/react.js"));
    }

    #[test]
    fn keeps_shipped_sources() {
        assert!(!is_ignored("src/mail-store.js"));
        assert!(!is_ignored("internal_packages/composer/lib/main.js"));
        assert!(!is_ignored("static/index.less"));
        assert!(!is_ignored("node_modules/react/lib/React.js"));
    }

    #[tokio::test]
    async fn copy_tree_applies_filters_and_preserves_links() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("app");
        std::fs::create_dir_all(src.join("src")).expect("mkdir");
        std::fs::create_dir_all(src.join(".git")).expect("mkdir");
        std::fs::write(src.join("src/main.js"), "app").expect("write");
        std::fs::write(src.join(".git/HEAD"), "ref").expect("write");
        #[cfg(unix)]
        std::os::unix::fs::symlink("src", src.join("srclink")).expect("symlink");

        let dst = dir.path().join("staged");
        copy_tree(&src, &dst, true).await.expect("copies");

        assert!(dst.join("src/main.js").exists());
        assert!(!dst.join(".git").exists());
        #[cfg(unix)]
        assert!(
            dst.join("srclink")
                .symlink_metadata()
                .expect("metadata")
                .file_type()
                .is_symlink()
        );
    }
}
