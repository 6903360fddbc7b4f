use super::types::MediaReference;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// User-agent sent on every provider request; some of the extraction APIs
/// reject clients that do not look like a browser.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable name of the provider
    fn name(&self) -> &'static str;

    /// Query the provider for a media reference. `Ok(None)` means the
    /// provider answered but has nothing usable for this URL (its own
    /// failure flag was set, or the expected fields were missing).
    async fn fetch(&self, url: &str) -> Result<Option<MediaReference>, ProviderError>;
}
