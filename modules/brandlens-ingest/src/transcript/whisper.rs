use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use brandlens_common::TranscriptSegment;

use super::ytdlp::YtdlpClient;
use super::TranscriptSource;

const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(600);

/// Last-resort source: download best-available audio and submit it to an
/// external speech-to-text endpoint.
pub struct SpeechToTextSource {
    ytdlp: YtdlpClient,
    api_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

#[derive(Deserialize)]
struct TranscriptionSegment {
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

impl SpeechToTextSource {
    pub fn new(ytdlp: YtdlpClient, api_url: &str, api_key: &str) -> Self {
        Self {
            ytdlp,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .timeout(TRANSCRIBE_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl TranscriptSource for SpeechToTextSource {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        // The TempDir guard keeps the audio file alive until transcription
        // finishes and guarantees cleanup afterwards.
        let Some((_tmp_dir, audio_path)) =
            self.ytdlp.download_audio(video_id, None, None).await?
        else {
            return Ok(None);
        };

        info!(video_id, path = %audio_path.display(), "Transcribing audio");

        let bytes = tokio::fs::read(&audio_path)
            .await
            .context("reading downloaded audio")?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("speech-to-text request failed")?;

        if !resp.status().is_success() {
            warn!(video_id, status = resp.status().as_u16(), "Speech-to-text returned error");
            return Ok(None);
        }

        let data: TranscriptionResponse =
            resp.json().await.context("parsing speech-to-text response")?;

        let segments: Vec<TranscriptSegment> = data
            .segments
            .into_iter()
            .filter_map(|s| {
                let text = s.text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(TranscriptSegment::new(s.start, s.end, text))
            })
            .collect();

        if segments.is_empty() {
            return Ok(None);
        }

        info!(video_id, count = segments.len(), "Audio transcription complete");
        Ok(Some(segments))
    }

    fn name(&self) -> &str {
        "speech_to_text"
    }
}
