//! End-to-end staging against a fake application checkout: ignore rules,
//! post-copy hook effects, and template rendering driven through the
//! public library surface.

use mailforge_release::{BuildSession, packager, publish, template};
use std::path::Path;

fn write_executable(path: &Path, body: &str) {
    std::fs::write(path, body).expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    }
}

fn fake_checkout(root: &Path) {
    std::fs::create_dir_all(root.join("src")).expect("mkdir");
    std::fs::create_dir_all(root.join("static")).expect("mkdir");
    std::fs::create_dir_all(root.join("internal_packages")).expect("mkdir");
    std::fs::create_dir_all(root.join(".git")).expect("mkdir");
    std::fs::create_dir_all(root.join("docs")).expect("mkdir");
    std::fs::create_dir_all(root.join("script")).expect("mkdir");

    std::fs::write(
        root.join("package.json"),
        r#"{"name":"mailforge","version":"1.2.3","description":"An extensible desktop mail client","productName":"MailForge","shortName":"MF"}"#,
    )
    .expect("write manifest");
    std::fs::write(root.join("src/mail-store.js"), "store").expect("write");
    std::fs::write(root.join("static/index.less"), "@body: #fff;").expect("write");
    std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/master").expect("write");
    std::fs::write(root.join("docs/guide.md"), "guide").expect("write");

    // Linked local package that the symlink-resolution hook must turn into
    // a real copy before the compile hook observes the tree.
    let checkout = root.join("dev-checkout");
    std::fs::create_dir_all(checkout.join("lib")).expect("mkdir");
    std::fs::write(checkout.join("lib/main.js"), "plugin").expect("write");
    #[cfg(unix)]
    std::os::unix::fs::symlink(&checkout, root.join("internal_packages/composer"))
        .expect("symlink");

    // Compile hook script: records whether any symlink survived into its
    // view of the staged tree.
    write_executable(
        &root.join("script/compile-cache"),
        "#!/bin/sh\nif [ -L \"$1/internal_packages/composer\" ]; then\n  echo symlinked > \"$2/seen\"\nelse\n  echo resolved > \"$2/seen\"\nfi\n",
    );
}

fn session_for(root: &Path) -> BuildSession {
    BuildSession::new(
        root.to_path_buf(),
        Some(root.join("dist")),
        Some("linux"),
        Some("x64"),
    )
    .expect("session builds")
}

#[cfg(unix)]
#[tokio::test]
async fn staging_filters_resolves_and_compiles_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    fake_checkout(dir.path());
    let session = session_for(dir.path());

    let staged = packager::stage(&session).await.expect("stages");
    assert_eq!(staged, session.staged_dir());

    // Shipped sources arrive, excluded trees do not.
    assert!(staged.join("src/mail-store.js").exists());
    assert!(!staged.join(".git").exists());
    assert!(!staged.join("docs").exists());
    assert!(!staged.join("script").exists());
    assert!(!staged.join("dist").exists());

    // The symlinked package was resolved into a real copy.
    let composer = staged.join("internal_packages/composer");
    let meta = std::fs::symlink_metadata(&composer).expect("metadata");
    assert!(!meta.file_type().is_symlink());
    assert!(composer.join("lib/main.js").exists());

    // The compile hook ran after resolution and saw no symlinks.
    let seen = std::fs::read_to_string(staged.join(".cache/seen")).expect("compile hook ran");
    assert_eq!(seen.trim(), "resolved");
}

#[tokio::test]
async fn restaging_is_clean() {
    let dir = tempfile::tempdir().expect("tempdir");
    fake_checkout(dir.path());
    let session = session_for(dir.path());

    let staged = packager::stage(&session).await.expect("stages");
    std::fs::write(staged.join("stale-artifact"), "old").expect("write");

    packager::stage(&session).await.expect("restages");
    assert!(!staged.join("stale-artifact").exists());
}

#[tokio::test]
async fn rendered_control_file_feeds_publish_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    fake_checkout(dir.path());
    let session = session_for(dir.path());
    std::fs::create_dir_all(&session.output_dir).expect("mkdir");

    let template_path = dir.path().join("control.in");
    std::fs::write(
        &template_path,
        "Package: {{name}}\nVersion: {{version}}\nArchitecture: {{arch}}\n",
    )
    .expect("write template");

    let mut ctx = template::TemplateContext::new();
    ctx.insert("name".into(), session.manifest.name.clone());
    ctx.insert("version".into(), session.manifest.version.clone());
    ctx.insert("arch".into(), session.arch.package_arch().into());

    let rendered = template::render(&session, &template_path, &ctx)
        .await
        .expect("renders");
    let body = std::fs::read_to_string(&rendered).expect("read back");
    assert!(body.contains("Architecture: amd64"));

    // An artifact named by the package builder publishes under the package
    // architecture and the short name.
    std::fs::write(session.output_dir.join("mailforge-1.2.3-amd64.deb"), "deb").expect("write");
    let artifacts = publish::enumerate_artifacts(&session, "1.2.3-abc1234")
        .await
        .expect("enumerates");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].key, "1.2.3-abc1234/linux-deb/amd64/MF.deb");
    assert_eq!(artifacts[0].content_type, Some("application/x-deb"));
}
