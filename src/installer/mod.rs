//! Platform installer builders.
//!
//! Each builder is a small state-free pipeline over the staged application
//! directory: render any platform metadata files, invoke the OS package
//! builder, and report the artifact. Architecture validation happens when
//! the [`crate::session::BuildSession`] is constructed — an unrecognized
//! architecture never reaches a builder, so no file is written for one.

pub mod deb;
pub mod macos;
pub mod rpm;
pub mod windows;

use crate::session::BuildSession;
use crate::template::TemplateContext;

/// Maintainer string stamped into Linux package metadata.
pub const MAINTAINER: &str = "MailForge Team <support@mailforge.example>";

/// Template context fields shared by the Linux builders.
pub(crate) fn linux_context(session: &BuildSession) -> TemplateContext {
    let manifest = &session.manifest;
    let mut ctx = TemplateContext::new();
    ctx.insert("name".into(), manifest.name.clone());
    ctx.insert("appName".into(), manifest.product_name.clone());
    ctx.insert("version".into(), manifest.version.clone());
    ctx.insert("description".into(), manifest.description.clone());
    ctx.insert("iconName".into(), manifest.name.clone());
    ctx.insert("appFileName".into(), manifest.name.clone());
    ctx.insert(
        "contentsDir".into(),
        session.staged_dir().to_string_lossy().into_owned(),
    );
    ctx.insert(
        "buildDir".into(),
        session.output_dir.to_string_lossy().into_owned(),
    );
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{TargetPlatform, testutil::test_session};
    use std::path::PathBuf;

    #[test]
    fn linux_context_carries_package_metadata() {
        let session = test_session(TargetPlatform::Linux, PathBuf::from("/tmp/app/dist"));
        let ctx = linux_context(&session);
        assert_eq!(ctx.get("name").map(String::as_str), Some("mailforge"));
        assert_eq!(ctx.get("version").map(String::as_str), Some("1.2.3"));
        assert!(ctx.get("contentsDir").is_some_and(|c| c.contains("linux-x64")));
    }
}
