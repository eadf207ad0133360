//! Stylesheet compilation: `.less` sources under `static/` compiled to
//! `.css` beside their sources via the external `lessc` compiler.

use crate::error::{ReleaseError, Result};
use crate::process;
use crate::session::BuildSession;
use std::path::PathBuf;

/// Compile every stylesheet under `static/`. A missing `static/` directory
/// means there is nothing to compile.
pub async fn run(session: &BuildSession) -> Result<()> {
    let static_dir = session.app_dir.join("static");
    let sources = less_sources(&static_dir);
    if sources.is_empty() {
        log::debug!("no stylesheets under {}", static_dir.display());
        return Ok(());
    }

    which::which("lessc").map_err(|_| ReleaseError::ToolNotFound {
        tool: "lessc".to_string(),
    })?;

    let include_path = format!(
        "--include-path={}:{}",
        static_dir.join("variables").display(),
        static_dir.display()
    );
    for source in sources {
        let output = source.with_extension("css");
        log::info!("compiling {}", source.display());
        process::run_in(
            &session.app_dir,
            "lessc",
            &[
                include_path.clone(),
                source.to_string_lossy().into_owned(),
                output.to_string_lossy().into_owned(),
            ],
        )
        .await?;
    }
    Ok(())
}

fn less_sources(static_dir: &std::path::Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(static_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("less")
        })
        .map(|entry| entry.into_path())
        .collect()
}
