use super::{
    provider::{Provider, ProviderError, USER_AGENT},
    types::{Engagement, MediaReference, UNKNOWN_AUTHOR},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_URL: &str = "https://tikdown.org/api";

pub struct TikdownProvider {
    api_url: String,
    timeout: Duration,
}

impl TikdownProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            api_url: API_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_api_url(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "videoUrl")]
    video_url: Option<String>,
    author: Option<String>,
    description: Option<String>,
    music: Option<String>,
}

fn normalize(response: FetchResponse) -> Option<MediaReference> {
    if !response.success {
        return None;
    }

    let media_url = response.video_url.unwrap_or_default();
    if media_url.is_empty() {
        return None;
    }

    Some(MediaReference {
        media_url,
        author: response
            .author
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: response.description,
        music: response.music,
        engagement: Engagement::default(),
        duration_secs: None,
    })
}

#[async_trait]
impl Provider for TikdownProvider {
    fn name(&self) -> &'static str {
        "tikdown"
    }

    async fn fetch(&self, url: &str) -> Result<Option<MediaReference>, ProviderError> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let response = client
            .post(&self.api_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .json(&FetchRequest { url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        debug!("tikdown response: {} bytes", body.len());

        let parsed: FetchResponse = serde_json::from_str(&body)?;
        Ok(normalize(parsed))
    }
}
