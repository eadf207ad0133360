//! Object-store uploads.
//!
//! Each artifact is a single authenticated public-read PUT under its
//! deterministic key. Progress is logged on each percentage-point change
//! while the artifact streams off disk into the request body.

use crate::error::{ReleaseError, Result};
use crate::publish::ArtifactDescriptor;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bucket receiving release artifacts unless overridden.
const DEFAULT_BUCKET: &str = "mailforge-builds";
/// Region used unless overridden.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client plus destination bucket. Stateless per call and safe to clone
/// into concurrent upload tasks.
#[derive(Clone)]
pub struct Uploader {
    client: Client,
    bucket: String,
}

impl Uploader {
    /// Build an uploader from explicit credentials, honoring
    /// `MAILFORGE_S3_BUCKET` and `MAILFORGE_S3_REGION` overrides.
    pub async fn new(access_key_id: String, secret_access_key: String) -> Self {
        let bucket =
            std::env::var("MAILFORGE_S3_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
        let region =
            std::env::var("MAILFORGE_S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "release-environment",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            bucket,
        }
    }

    /// Upload one artifact; returns its public location.
    pub async fn put(&self, artifact: &ArtifactDescriptor) -> Result<String> {
        log::info!(
            "uploading {} to {}",
            artifact.local_path.display(),
            artifact.key
        );

        let body = read_with_progress(&artifact.local_path, &artifact.key).await?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&artifact.key)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(body));
        if let Some(content_type) = artifact.content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| ReleaseError::Upload {
            key: artifact.key.clone(),
            reason: e.to_string(),
        })?;

        Ok(format!(
            "https://{}.s3.amazonaws.com/{}",
            self.bucket, artifact.key
        ))
    }
}

/// Read the artifact into the request body, logging each percentage point.
async fn read_with_progress(path: &Path, key: &str) -> Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();
    let mut body = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; 256 * 1024];
    let mut last_pct = 0u64;

    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
        if total > 0 {
            let pct = body.len() as u64 * 100 / total;
            if pct != last_pct {
                last_pct = pct;
                log::info!("uploading {key} {pct}%");
            }
        }
    }
    Ok(Bytes::from(body))
}

/// Hex-encoded SHA-256 of an artifact, recorded in the publish log.
pub async fn sha256_hex(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; 256 * 1024];
    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
