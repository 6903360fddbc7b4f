use super::{
    provider::{Provider, ProviderError, USER_AGENT},
    types::{Engagement, MediaReference, UNKNOWN_AUTHOR},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

const API_URL: &str = "https://www.tikwm.com/api/";
const ORIGIN: &str = "https://www.tikwm.com";

pub struct TikwmProvider {
    api_url: String,
    origin: String,
    timeout: Duration,
}

impl TikwmProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            api_url: API_URL.to_string(),
            origin: ORIGIN.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_api_url(
        api_url: impl Into<String>,
        origin: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            origin: origin.into(),
            timeout,
        }
    }
}

// Form-encoded; the extra fields match what the tikwm web client sends.
#[derive(Serialize)]
struct FetchRequest<'a> {
    url: &'a str,
    count: u32,
    cursor: u32,
    web: u8,
    hd: u8,
}

#[derive(Deserialize)]
struct FetchResponse {
    code: Option<i64>,
    data: Option<VideoData>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VideoData {
    play: Option<String>,
    title: Option<String>,
    duration: Option<u64>,
    author: Option<VideoAuthor>,
    music_info: Option<MusicInfo>,
    stats: Option<VideoStats>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VideoAuthor {
    nickname: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct MusicInfo {
    title: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VideoStats {
    #[serde(rename = "diggCount")]
    digg_count: Option<u64>,
    #[serde(rename = "commentCount")]
    comment_count: Option<u64>,
    #[serde(rename = "shareCount")]
    share_count: Option<u64>,
    #[serde(rename = "playCount")]
    play_count: Option<u64>,
}

// tikwm sometimes hands back a path like /video/abc.mp4 instead of a full
// URL; those are only valid relative to tikwm's own origin.
fn absolute_media_url(play: String, origin: &str) -> Option<String> {
    if play.starts_with("http") {
        return Some(play);
    }
    let base = Url::parse(origin).ok()?;
    Some(base.join(&play).ok()?.to_string())
}

// code 0 is tikwm's success convention; a missing code is a failure, not a
// default success.
fn normalize(response: FetchResponse, origin: &str) -> Option<MediaReference> {
    if response.code != Some(0) {
        return None;
    }

    let data = response.data?;
    let play = data.play.unwrap_or_default();
    if play.is_empty() {
        return None;
    }
    let media_url = absolute_media_url(play, origin)?;

    let stats = data.stats.unwrap_or_default();

    Some(MediaReference {
        media_url,
        author: data
            .author
            .and_then(|a| a.nickname)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: data.title,
        music: data.music_info.and_then(|m| m.title),
        engagement: Engagement {
            likes: stats.digg_count,
            comments: stats.comment_count,
            shares: stats.share_count,
            views: stats.play_count,
        },
        duration_secs: data.duration,
    })
}

#[async_trait]
impl Provider for TikwmProvider {
    fn name(&self) -> &'static str {
        "tikwm"
    }

    async fn fetch(&self, url: &str) -> Result<Option<MediaReference>, ProviderError> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let response = client
            .post(&self.api_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .form(&FetchRequest {
                url,
                count: 12,
                cursor: 0,
                web: 1,
                hd: 1,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        debug!("tikwm response: {} bytes", body.len());

        let parsed: FetchResponse = serde_json::from_str(&body)?;
        Ok(normalize(parsed, &self.origin))
    }
}
