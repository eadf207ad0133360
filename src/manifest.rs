//! Application manifest loaded from the email client's `package.json`.

use crate::error::{ReleaseError, Result};
use serde::Deserialize;
use std::path::Path;

/// Package metadata for the application being released.
///
/// Read once per invocation from `<app_dir>/package.json` and carried on the
/// build session. The `short_name` is the basename used for published
/// artifacts (`<short_name>.deb`, `<short_name>.zip`); it falls back to the
/// package name when the manifest does not declare one.
#[derive(Debug, Clone, Deserialize)]
pub struct AppManifest {
    /// Package name, e.g. "mailforge"
    pub name: String,

    /// Version string, e.g. "1.2.3" or "1.2.3-beta2"
    pub version: String,

    /// Package description used in installer metadata
    #[serde(default)]
    pub description: String,

    /// Human-readable product name, e.g. "MailForge"
    #[serde(rename = "productName")]
    pub product_name: String,

    /// Artifact basename override, e.g. "MF"
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
}

impl AppManifest {
    /// Load the manifest from a `package.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ReleaseError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ReleaseError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Basename for published artifacts.
    pub fn short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    /// Name of the packaged executable, e.g. "MailForge.exe" on Windows.
    pub fn exe_name(&self) -> String {
        format!("{}.exe", self.product_name)
    }
}
