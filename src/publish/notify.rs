//! Chat-webhook notification.
//!
//! Posting is best-effort configuration: when no hook URL is set the
//! webhook silently skips, which is not an error.

use crate::error::Result;

/// Environment variable naming the chat webhook URL.
pub const HOOK_URL_VAR: &str = "MAILFORGE_HOOK_URL";

/// Username the build notifications post as.
const HOOK_USERNAME: &str = "MailForge Builds";

/// Webhook endpoint; cloneable into concurrent upload tasks.
#[derive(Clone)]
pub struct Webhook {
    url: Option<String>,
    client: reqwest::Client,
}

impl Webhook {
    /// Pick up the hook URL from the environment, if configured.
    pub fn from_env() -> Self {
        let url = std::env::var(HOOK_URL_VAR).ok().filter(|u| !u.is_empty());
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    /// A webhook that never posts (tests, local runs).
    pub fn disabled() -> Self {
        Self {
            url: None,
            client: reqwest::Client::new(),
        }
    }

    /// Post a message; a no-op when no hook URL is configured.
    pub async fn post(&self, text: &str) -> Result<()> {
        let Some(url) = &self.url else {
            log::debug!("no {HOOK_URL_VAR} configured, skipping notification");
            return Ok(());
        };
        self.client
            .post(url)
            .json(&serde_json::json!({
                "username": HOOK_USERNAME,
                "text": text,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
