use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use brandlens_common::TranscriptSegment;

use super::TranscriptSource;

/// Hosted captions provider. Returns subtitle tracks as timed cue lists.
pub struct CaptionsApiSource {
    api_key: String,
    host: String,
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CaptionTrack {
    #[serde(default)]
    subtitle: Vec<CaptionCue>,
}

#[derive(Deserialize)]
struct CaptionCue {
    #[serde(default)]
    start: f64,
    #[serde(default)]
    dur: f64,
    #[serde(default)]
    text: String,
}

impl CaptionsApiSource {
    pub fn new(api_key: &str, host: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            host: host.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: format!("https://{host}"),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl TranscriptSource for CaptionsApiSource {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        let url = format!("{}/download-all/{}", self.base_url, video_id);

        let resp = self
            .http
            .get(&url)
            .query(&[("format_subtitle", "json"), ("format_answer", "json")])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await
            .context("captions API request failed")?;

        let status = resp.status().as_u16();
        // 403 is an auth/quota problem and 429 is throttling. Neither is
        // worth retrying here; the chain falls through to the next source.
        if status == 403 || status == 429 {
            warn!(video_id, status, "Captions API refused request, falling through");
            return Ok(None);
        }
        if status != 200 {
            warn!(video_id, status, "Captions API returned unexpected status");
            return Ok(None);
        }

        let tracks: Vec<CaptionTrack> = match resp.json().await {
            Ok(tracks) => tracks,
            // An error object instead of a track list is a miss, not a failure.
            Err(e) => {
                warn!(video_id, error = %e, "Captions API payload was not a track list");
                return Ok(None);
            }
        };

        let segments: Vec<TranscriptSegment> = tracks
            .into_iter()
            .flat_map(|track| track.subtitle)
            .filter_map(|cue| {
                let text = cue.text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(TranscriptSegment::new(cue.start, cue.start + cue.dur, text))
            })
            .collect();

        if segments.is_empty() {
            return Ok(None);
        }

        info!(video_id, count = segments.len(), "Captions API transcript fetched");
        Ok(Some(segments))
    }

    fn name(&self) -> &str {
        "captions_api"
    }
}
