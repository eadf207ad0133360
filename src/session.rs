//! Build session: the per-invocation configuration threaded through every
//! task. Constructed once, immutable during a run.

use crate::error::{ReleaseError, Result};
use crate::manifest::AppManifest;
use std::path::PathBuf;

/// Target CPU architecture for packaged builds.
///
/// Closed set: anything the host reports outside of it is a fatal
/// configuration error, never a silently-skipped case.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetArch {
    /// 32-bit x86 ("ia32" in node-style naming)
    Ia32,
    /// 64-bit x86 ("x64" in node-style naming)
    X64,
}

impl TargetArch {
    /// Detect the architecture of the host machine.
    pub fn host() -> Result<Self> {
        Self::parse(std::env::consts::ARCH)
    }

    /// Parse an architecture identifier (accepts both node-style and
    /// Rust-style names).
    pub fn parse(arch: &str) -> Result<Self> {
        match arch {
            "ia32" | "x86" | "i386" | "i686" => Ok(Self::Ia32),
            "x64" | "x86_64" | "amd64" => Ok(Self::X64),
            other => Err(ReleaseError::UnsupportedArch {
                arch: other.to_string(),
            }),
        }
    }

    /// Node-style identifier used in staged directory names and upload keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ia32 => "ia32",
            Self::X64 => "x64",
        }
    }

    /// Linux package-architecture string (`ia32` → `i386`, `x64` → `amd64`).
    pub fn package_arch(self) -> &'static str {
        match self {
            Self::Ia32 => "i386",
            Self::X64 => "amd64",
        }
    }
}

/// Target platform for packaged builds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetPlatform {
    /// Linux (.deb / .rpm installers)
    Linux,
    /// macOS (zip archive of the .app bundle)
    MacOs,
    /// Windows (setup executable)
    Windows,
}

impl TargetPlatform {
    /// Detect the platform of the host machine.
    pub fn host() -> Result<Self> {
        Self::parse(std::env::consts::OS)
    }

    /// Parse a platform identifier (accepts both node-style and Rust-style
    /// names).
    pub fn parse(platform: &str) -> Result<Self> {
        match platform {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::MacOs),
            "win32" | "windows" => Ok(Self::Windows),
            other => Err(ReleaseError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }

    /// Node-style identifier used in staged directory names and upload keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "darwin",
            Self::Windows => "win32",
        }
    }
}

/// Per-invocation build configuration.
///
/// Everything a task needs is either here or derivable from here; no
/// process-wide state is consulted after construction.
#[derive(Debug, Clone)]
pub struct BuildSession {
    /// Root of the application source checkout
    pub app_dir: PathBuf,
    /// Directory receiving staged builds, rendered files, and artifacts
    pub output_dir: PathBuf,
    /// Platform being packaged
    pub platform: TargetPlatform,
    /// Architecture being packaged
    pub arch: TargetArch,
    /// Application manifest from `<app_dir>/package.json`
    pub manifest: AppManifest,
}

impl BuildSession {
    /// Construct a session for the given checkout, detecting platform and
    /// architecture from the host when overrides are not supplied.
    pub fn new(
        app_dir: PathBuf,
        output_dir: Option<PathBuf>,
        platform: Option<&str>,
        arch: Option<&str>,
    ) -> Result<Self> {
        let platform = match platform {
            Some(p) => TargetPlatform::parse(p)?,
            None => TargetPlatform::host()?,
        };
        let arch = match arch {
            Some(a) => TargetArch::parse(a)?,
            None => TargetArch::host()?,
        };
        let manifest = AppManifest::load(&app_dir.join("package.json"))?;
        let output_dir = output_dir.unwrap_or_else(|| app_dir.join("dist"));
        Ok(Self {
            app_dir,
            output_dir,
            platform,
            arch,
            manifest,
        })
    }

    /// The packaged application directory produced by staging.
    ///
    /// Linux builds are named after the package (`mailforge-linux-x64`);
    /// macOS and Windows builds after the product
    /// (`MailForge-darwin-x64`), matching what the installers expect.
    pub fn staged_dir(&self) -> PathBuf {
        let base = match self.platform {
            TargetPlatform::Linux => &self.manifest.name,
            TargetPlatform::MacOs | TargetPlatform::Windows => &self.manifest.product_name,
        };
        self.output_dir.join(format!(
            "{}-{}-{}",
            base,
            self.platform.label(),
            self.arch.label()
        ))
    }

    /// Directory holding on-disk template and resource files for a platform.
    pub fn resources_dir(&self, platform_dir: &str) -> PathBuf {
        self.app_dir.join("build").join("resources").join(platform_dir)
    }

    /// Directory the Windows installer generator writes into.
    pub fn installer_dir(&self) -> PathBuf {
        self.output_dir.join("installer")
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// A session over a fixed manifest for builder and publisher tests.
    pub(crate) fn test_session(platform: TargetPlatform, output_dir: PathBuf) -> BuildSession {
        let manifest: crate::manifest::AppManifest = serde_json::from_str(
            r#"{"name":"mailforge","version":"1.2.3","description":"An extensible desktop mail client","productName":"MailForge","shortName":"MF"}"#,
        )
        .expect("manifest parses");
        BuildSession {
            app_dir: output_dir.parent().unwrap_or(&output_dir).to_path_buf(),
            output_dir,
            platform,
            arch: TargetArch::X64,
            manifest,
        }
    }
}
