use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ChannelMeta, NewVideo};

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Hard cap imposed by the Data API search endpoint.
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    channel_id: String,
    title: String,
    #[serde(default)]
    description: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    items: Vec<DetailItem>,
}

#[derive(Debug, Deserialize)]
struct DetailItem {
    snippet: DetailSnippet,
}

#[derive(Debug, Deserialize)]
struct DetailSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Stateless, quota-aware client for the search/listing API. Page requests
/// follow the continuation-token protocol with a fixed blocking delay
/// between pages; request errors are logged and swallowed so the caller can
/// persist whatever was already accumulated.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: String,
    page_delay: Duration,
}

impl YoutubeClient {
    pub fn new(api_key: String, page_delay: Duration) -> Self {
        Self::with_base_url(api_key, page_delay, YOUTUBE_API_URL.to_string())
    }

    /// Same client rooted at a custom API base URL.
    pub fn with_base_url(api_key: String, page_delay: Duration, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tubewatch/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
            page_delay,
        }
    }

    /// Most recent videos for a search term, newest first.
    pub async fn search_by_keyword(
        &self,
        term: &str,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Vec<NewVideo> {
        self.fetch_pages(&[("q", term.to_string())], page_size, max_pages)
            .await
    }

    /// Most recent uploads of a channel, same pagination contract as search.
    pub async fn latest_by_channel(
        &self,
        channel_id: &str,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Vec<NewVideo> {
        self.fetch_pages(&[("channelId", channel_id.to_string())], page_size, max_pages)
            .await
    }

    async fn fetch_pages(
        &self,
        extra: &[(&str, String)],
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Vec<NewVideo> {
        let page_size = page_size.min(MAX_PAGE_SIZE);
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0u32;

        loop {
            if page > 0 {
                // Quota backoff between successive page requests.
                tokio::time::sleep(self.page_delay).await;
            }

            let mut params: Vec<(&str, String)> = vec![
                ("part", "snippet".to_string()),
                ("type", "video".to_string()),
                ("order", "date".to_string()),
                ("maxResults", page_size.to_string()),
                ("key", self.api_key.clone()),
            ];
            params.extend(extra.iter().cloned());
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = match self.request_search(&params).await {
                Ok(response) => response,
                Err(e) => {
                    // Fail open: return what we already have so the
                    // rotation can still advance on partial progress.
                    tracing::warn!("search page {} failed: {}", page + 1, e);
                    break;
                }
            };

            for item in response.items {
                let Some(video_id) = item.id.video_id else {
                    continue;
                };
                videos.push(NewVideo {
                    video_id,
                    channel_id: item.snippet.channel_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    published_at: item.snippet.published_at,
                });
            }

            page += 1;
            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
            if let Some(max) = max_pages {
                if page >= max {
                    break;
                }
            }
        }

        videos
    }

    async fn request_search(&self, params: &[(&str, String)]) -> Result<SearchResponse> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::YoutubeApi(format!(
                "search returned {}: {}",
                status,
                truncate(&error_text, 200)
            )));
        }

        Ok(response.json().await?)
    }

    /// Externally reported tags of a single video. Empty on any error; tag
    /// lookup failure must never abort a collection pass.
    pub async fn item_tags(&self, video_id: &str) -> Vec<String> {
        match self.request_detail("videos", &[("id", video_id.to_string())]).await {
            Ok(mut response) => {
                if response.items.is_empty() {
                    Vec::new()
                } else {
                    response.items.remove(0).snippet.tags
                }
            }
            Err(e) => {
                tracing::warn!("tag lookup failed for {}: {}", video_id, e);
                Vec::new()
            }
        }
    }

    /// Title/description of a channel, used to (re)label the registry entry.
    pub async fn channel_meta(&self, channel_id: &str) -> Option<ChannelMeta> {
        match self.request_detail("channels", &[("id", channel_id.to_string())]).await {
            Ok(mut response) => {
                if response.items.is_empty() {
                    None
                } else {
                    let snippet = response.items.remove(0).snippet;
                    Some(ChannelMeta {
                        title: snippet.title,
                        description: snippet.description,
                    })
                }
            }
            Err(e) => {
                tracing::warn!("channel lookup failed for {}: {}", channel_id, e);
                None
            }
        }
    }

    async fn request_detail(
        &self,
        endpoint: &str,
        extra: &[(&str, String)],
    ) -> Result<DetailResponse> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("key", self.api_key.clone()),
        ];
        params.extend(extra.iter().cloned());

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::YoutubeApi(format!(
                "{} returned {}: {}",
                endpoint,
                status,
                truncate(&error_text, 200)
            )));
        }

        Ok(response.json().await?)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
