use super::{
    provider::{Provider, ProviderError, USER_AGENT},
    types::{Engagement, MediaReference, UNKNOWN_AUTHOR},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_URL: &str = "https://api.savetiktok.org/video";

pub struct SavetiktokProvider {
    api_url: String,
    timeout: Duration,
}

impl SavetiktokProvider {
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
    download_url: Option<String>,
    author: Option<VideoAuthor>,
    description: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VideoAuthor {
    nickname: Option<String>,
}

fn normalize(response: FetchResponse) -> Option<MediaReference> {
    if !response.success {
        return None;
    }

    let media_url = response.download_url.unwrap_or_default();
    if media_url.is_empty() {
        return None;
    }

    Some(MediaReference {
        media_url,
        author: response
            .author
            .and_then(|a| a.nickname)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: response.description,
        music: None,
        engagement: Engagement::default(),
        duration_secs: None,
    })
}

#[async_trait]
impl Provider for SavetiktokProvider {
    fn name(&self) -> &'static str {
        "savetiktok"
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
        debug!("savetiktok response: {} bytes", body.len());

        let parsed: FetchResponse = serde_json::from_str(&body)?;
        Ok(normalize(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_is_normalized() {
        let parsed: FetchResponse = serde_json::from_str(
            r#"{
                "success": true,
                "download_url": "https://cdn.savetiktok.org/video/abc.mp4",
                "author": {"nickname": "somebody"},
                "description": "a clip"
            }"#,
        )
        .unwrap();

        let reference = normalize(parsed).unwrap();
        assert_eq!(
            reference.media_url,
            "https://cdn.savetiktok.org/video/abc.mp4"
        );
        assert_eq!(reference.author, "somebody");
        assert_eq!(reference.description.as_deref(), Some("a clip"));
        assert_eq!(reference.music, None);
        assert_eq!(reference.engagement, Engagement::default());
    }

    #[test]
    fn test_failure_flag_yields_no_result() {
        let parsed: FetchResponse = serde_json::from_str(
            r#"{"success": false, "download_url": "https://x.y/v.mp4"}"#,
        )
        .unwrap();
        assert!(normalize(parsed).is_none());
    }

    #[test]
    fn test_missing_author_nickname_defaults_to_unknown() {
        let parsed: FetchResponse = serde_json::from_str(
            r#"{"success": true, "download_url": "https://x.y/v.mp4", "author": {}}"#,
        )
        .unwrap();
        assert_eq!(normalize(parsed).unwrap().author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_empty_download_url_yields_no_result() {
        let parsed: FetchResponse =
            serde_json::from_str(r#"{"success": true, "download_url": ""}"#).unwrap();
        assert!(normalize(parsed).is_none());
    }
}
