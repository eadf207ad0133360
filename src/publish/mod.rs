//! Publisher: uploads release artifacts to the object store and posts a
//! completion notice per artifact.
//!
//! Uploads run concurrently; publish completes only when every upload has
//! settled. A single failure fails the whole publish task but does not
//! cancel sibling uploads already in flight.

pub mod notify;
pub mod upload;

use crate::error::{ReleaseError, Result, required_env};
use crate::process;
use crate::session::{BuildSession, TargetPlatform};
use std::path::PathBuf;
use tokio::task::JoinSet;

/// One file to upload: where it lives, where it goes, and how it is served.
#[derive(Debug, Clone)]
pub struct ArtifactDescriptor {
    /// Local artifact file
    pub local_path: PathBuf,
    /// Destination key: `<version>/<platform>[-<kind>]/<arch>/<name>`
    pub key: String,
    /// Content-type override (`.deb`/`.rpm`); None leaves the store default
    pub content_type: Option<&'static str>,
}

/// Upload every artifact for the current platform and notify per upload.
pub async fn publish(session: &BuildSession) -> Result<()> {
    let access_key_id = required_env("AWS_ACCESS_KEY_ID")?;
    let secret_access_key = required_env("AWS_SECRET_ACCESS_KEY")?;

    let version = resolve_version(session).await?;
    log::info!("publishing version {version}");

    let artifacts = enumerate_artifacts(session, &version).await?;
    if artifacts.is_empty() {
        log::warn!("no artifacts found in {}", session.output_dir.display());
        return Ok(());
    }

    let uploader = upload::Uploader::new(access_key_id, secret_access_key).await;
    let webhook = notify::Webhook::from_env();
    let product = session.manifest.product_name.clone();

    let mut uploads = JoinSet::new();
    for artifact in artifacts {
        let uploader = uploader.clone();
        let webhook = webhook.clone();
        let product = product.clone();
        uploads.spawn(async move {
            let key = artifact.key.clone();
            let checksum = upload::sha256_hex(&artifact.local_path).await?;
            log::info!("{} sha256 {}", key, checksum);
            let location = uploader.put(&artifact).await?;
            webhook
                .post(&format!(
                    "{product} release asset uploaded: <{location}|{key}>"
                ))
                .await?;
            Ok::<String, ReleaseError>(key)
        });
    }

    // Join every upload; report the first failure without cancelling siblings.
    let mut first_error = None;
    while let Some(joined) = uploads.join_next().await {
        match joined {
            Ok(Ok(key)) => log::info!("uploaded {key}"),
            Ok(Err(e)) => {
                log::error!("{e}");
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                first_error
                    .get_or_insert_with(|| anyhow::anyhow!("upload task panicked: {join_error}").into());
            }
        }
    }

    match first_error {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

/// Resolve the release version: a manifest version already carrying a
/// pre-release qualifier is used verbatim, otherwise the short revision of
/// the current checkout is appended.
pub async fn resolve_version(session: &BuildSession) -> Result<String> {
    if session.manifest.version.contains('-') {
        return Ok(session.manifest.version.clone());
    }
    let revision = process::run_in(&session.app_dir, "git", &["rev-parse", "--short", "HEAD"])
        .await?
        .stdout;
    Ok(full_version(&session.manifest.version, revision.trim()))
}

fn full_version(manifest_version: &str, revision: &str) -> String {
    if manifest_version.contains('-') {
        manifest_version.to_string()
    } else {
        format!("{manifest_version}-{revision}")
    }
}

/// The artifacts to publish for the session's platform: one zip for macOS,
/// the three installer files for Windows, every `.deb`/`.rpm` in the output
/// directory for Linux.
pub async fn enumerate_artifacts(
    session: &BuildSession,
    version: &str,
) -> Result<Vec<ArtifactDescriptor>> {
    let short = session.manifest.short_name();
    let arch = session.arch.label();

    let artifacts = match session.platform {
        TargetPlatform::MacOs => {
            let name = format!("{short}.zip");
            vec![ArtifactDescriptor {
                local_path: session.output_dir.join(&name),
                key: format!("{version}/darwin/{arch}/{name}"),
                content_type: None,
            }]
        }
        TargetPlatform::Windows => {
            let installer_dir = session.installer_dir();
            let setup = format!("{}Setup.exe", session.manifest.product_name);
            let nupkg = format!(
                "{}-{}-full.nupkg",
                session.manifest.name, session.manifest.version
            );
            vec![
                ArtifactDescriptor {
                    local_path: installer_dir.join("RELEASES"),
                    key: format!("{version}/win32/{arch}/RELEASES"),
                    content_type: None,
                },
                ArtifactDescriptor {
                    local_path: installer_dir.join(&setup),
                    key: format!("{version}/win32/{arch}/{short}Setup.exe"),
                    content_type: None,
                },
                ArtifactDescriptor {
                    local_path: installer_dir.join(&nupkg),
                    key: format!("{version}/win32/{arch}/{nupkg}"),
                    content_type: None,
                },
            ]
        }
        TargetPlatform::Linux => {
            let package_arch = session.arch.package_arch();
            let mut found = Vec::new();
            let mut entries = tokio::fs::read_dir(&session.output_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                match path.extension().and_then(|e| e.to_str()) {
                    Some("deb") => found.push(ArtifactDescriptor {
                        local_path: path,
                        key: format!("{version}/linux-deb/{package_arch}/{short}.deb"),
                        content_type: Some("application/x-deb"),
                    }),
                    Some("rpm") => found.push(ArtifactDescriptor {
                        local_path: path,
                        key: format!("{version}/linux-rpm/{package_arch}/{short}.rpm"),
                        content_type: Some("application/x-rpm"),
                    }),
                    _ => {}
                }
            }
            found
        }
    };

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testutil::test_session;

    #[test]
    fn plain_version_gets_revision_suffix() {
        assert_eq!(full_version("1.2.3", "abc1234"), "1.2.3-abc1234");
    }

    #[test]
    fn prerelease_version_is_used_verbatim() {
        assert_eq!(full_version("1.2.3-beta2", "abc1234"), "1.2.3-beta2");
    }

    #[tokio::test]
    async fn linux_artifacts_get_package_arch_keys_and_content_types() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(TargetPlatform::Linux, dir.path().join("dist"));
        std::fs::create_dir_all(&session.output_dir).expect("mkdir");
        std::fs::write(session.output_dir.join("mailforge-1.2.3-amd64.deb"), "deb").expect("write");
        std::fs::write(session.output_dir.join("mailforge-1.2.3.x86_64.rpm"), "rpm").expect("write");
        std::fs::write(session.output_dir.join("notes.txt"), "skip").expect("write");

        let mut artifacts = enumerate_artifacts(&session, "1.2.3-abc1234")
            .await
            .expect("enumerates");
        artifacts.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].key, "1.2.3-abc1234/linux-deb/amd64/MF.deb");
        assert_eq!(artifacts[0].content_type, Some("application/x-deb"));
        assert_eq!(artifacts[1].key, "1.2.3-abc1234/linux-rpm/amd64/MF.rpm");
        assert_eq!(artifacts[1].content_type, Some("application/x-rpm"));
    }

    #[tokio::test]
    async fn macos_publishes_a_single_zip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(TargetPlatform::MacOs, dir.path().join("dist"));
        let artifacts = enumerate_artifacts(&session, "1.2.3-abc1234")
            .await
            .expect("enumerates");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].key, "1.2.3-abc1234/darwin/x64/MF.zip");
        assert_eq!(artifacts[0].content_type, None);
    }

    #[tokio::test]
    async fn windows_publishes_the_three_installer_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(TargetPlatform::Windows, dir.path().join("dist"));
        let artifacts = enumerate_artifacts(&session, "1.2.3-abc1234")
            .await
            .expect("enumerates");
        let keys: Vec<&str> = artifacts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "1.2.3-abc1234/win32/x64/RELEASES",
                "1.2.3-abc1234/win32/x64/MFSetup.exe",
                "1.2.3-abc1234/win32/x64/mailforge-1.2.3-full.nupkg",
            ]
        );
    }

    #[tokio::test]
    async fn prerelease_manifest_skips_the_revision_query() {
        // No git checkout under the tempdir, so this only passes if the
        // version is taken verbatim.
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = test_session(TargetPlatform::Linux, dir.path().join("dist"));
        session.manifest.version = "2.0.0-rc1".into();
        let version = resolve_version(&session).await.expect("resolves");
        assert_eq!(version, "2.0.0-rc1");
    }
}
