//! Channel/video discovery against the YouTube Data API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use brandlens_common::{ChannelDetails, IngestError, RetryPolicy, VideoMetadata};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: usize = 50;

/// Discovery collaborator: recent uploads and per-video metadata.
#[async_trait]
pub trait VideoDirectory: Send + Sync {
    async fn channel_details(&self, channel_id: &str) -> Result<ChannelDetails, IngestError>;
    /// Most recent video ids for a channel, newest first, capped at `limit`.
    async fn recent_video_ids(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, IngestError>;
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, IngestError>;
}

// ---------------------------------------------------------------------------
// YouTube Data API v3 implementation
// ---------------------------------------------------------------------------

pub struct YouTubeDirectory {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YouTubeDirectory {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: API_BASE.to_string(),
            retry: RetryPolicy::rate_limit(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// One API GET with quota-aware retries. A 429 backs off and retries;
    /// other HTTP errors are surfaced as transient.
    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, IngestError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.retry
            .run(
                || async {
                    let resp = self
                        .http
                        .get(format!("{}/{path}", self.base_url))
                        .query(query)
                        .send()
                        .await
                        .map_err(|e| IngestError::TransientIo(e.to_string()))?;

                    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(IngestError::RateLimited(format!(
                            "{path} returned 429"
                        )));
                    }

                    resp.error_for_status()
                        .map_err(|e| IngestError::TransientIo(e.to_string()))?
                        .json()
                        .await
                        .map_err(|e| IngestError::TransientIo(e.to_string()))
                },
                IngestError::is_retryable,
            )
            .await
    }

    /// The uploads playlist id holds a channel's full upload history in
    /// reverse-chronological order.
    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, IngestError> {
        let resp: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "contentDetails"),
                    ("id", channel_id),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        resp.items
            .into_iter()
            .next()
            .and_then(|item| item.content_details)
            .map(|cd| cd.related_playlists.uploads)
            .ok_or_else(|| IngestError::NotFound(format!("channel {channel_id}")))
    }
}

#[async_trait]
impl VideoDirectory for YouTubeDirectory {
    async fn channel_details(&self, channel_id: &str) -> Result<ChannelDetails, IngestError> {
        let resp: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,statistics"),
                    ("id", channel_id),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        let item = resp
            .items
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::NotFound(format!("channel {channel_id}")))?;

        let snippet = item.snippet.unwrap_or_default();
        let stats = item.statistics.unwrap_or_default();

        Ok(ChannelDetails {
            channel_id: channel_id.to_string(),
            title: snippet.title,
            description: snippet.description,
            subscriber_count: stats.subscriber_count.parse().unwrap_or(0),
            video_count: stats.video_count.parse().unwrap_or(0),
            view_count: stats.view_count.parse().unwrap_or(0),
            creation_date: snippet
                .published_at
                .as_deref()
                .and_then(|s| s.parse().ok()),
            thumbnail_url: snippet.thumbnails.default.map(|t| t.url).unwrap_or_default(),
        })
    }

    async fn recent_video_ids(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, IngestError> {
        let playlist_id = self.uploads_playlist_id(channel_id).await?;

        let mut video_ids = Vec::new();
        let mut page_token: Option<String> = None;

        while video_ids.len() < limit {
            let max_results = PAGE_SIZE.min(limit - video_ids.len()).to_string();
            let mut query = vec![
                ("part".to_string(), "contentDetails".to_string()),
                ("playlistId".to_string(), playlist_id.clone()),
                ("maxResults".to_string(), max_results),
                ("key".to_string(), self.api_key.clone()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let resp: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;

            for item in resp.items {
                video_ids.push(item.content_details.video_id);
            }

            page_token = resp.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        info!(channel_id, count = video_ids.len(), "Listed recent videos");
        Ok(video_ids)
    }

    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, IngestError> {
        let resp: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("id", video_id),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        // Private and deleted videos come back as an empty item list.
        let item = resp.items.into_iter().next().ok_or_else(|| {
            warn!(video_id, "Video not found in directory");
            IngestError::NotFound(format!("video {video_id}"))
        })?;

        let snippet = item.snippet.unwrap_or_default();
        let stats = item.statistics.unwrap_or_default();
        let content_details = item.content_details.unwrap_or_default();

        Ok(VideoMetadata {
            id: video_id.to_string(),
            channel_id: snippet.channel_id,
            title: snippet.title,
            channel_title: snippet.channel_title,
            published_at: snippet
                .published_at
                .as_deref()
                .and_then(|s| s.parse().ok()),
            duration: content_details.duration,
            view_count: stats.view_count.parse().unwrap_or(0),
            like_count: stats.like_count.parse().unwrap_or(0),
            thumbnail_url: snippet.thumbnails.high.map(|t| t.url).unwrap_or_default(),
            tags: snippet.tags,
            category: snippet.category_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemContentDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
    content_details: Option<VideoContentDetails>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    category_id: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    default: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: String,
    #[serde(default)]
    subscriber_count: String,
    #[serde(default)]
    video_count: String,
    #[serde(default)]
    like_count: String,
}

#[derive(Deserialize, Default)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}
