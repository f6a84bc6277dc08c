//! yt-dlp subprocess wrapper for subtitle and audio downloads.
//!
//! Downloads land in a scoped temp directory so partial files are removed
//! when the guard drops, whether or not parsing succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{info, warn};

use brandlens_common::TranscriptSegment;

use super::proxy::ProxyPool;
use super::subtitles::parse_subtitles;
use super::TranscriptSource;

const SUBTITLE_TIMEOUT: Duration = Duration::from_secs(60);
const AUDIO_TIMEOUT: Duration = Duration::from_secs(300);

const AUDIO_EXTENSIONS: &[&str] = &["webm", "m4a", "mp3", "wav", "opus"];

#[derive(Clone)]
pub struct YtdlpClient {
    bin: String,
}

impl YtdlpClient {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    /// Download English subtitles (manual or auto-generated) for a video and
    /// parse them. Returns None when the video has no subtitles or the
    /// download fails.
    pub async fn download_subtitles(
        &self,
        video_id: &str,
        proxy: Option<&str>,
        cookies: Option<&Path>,
    ) -> Result<Option<Vec<TranscriptSegment>>> {
        let tmp_dir = tempfile::tempdir().context("creating subtitle temp dir")?;
        let out_template = tmp_dir.path().join("sub");

        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let mut args: Vec<String> = vec![
            "--skip-download".to_string(),
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            "en".to_string(),
            "--socket-timeout".to_string(),
            "10".to_string(),
            "--retries".to_string(),
            "2".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--output".to_string(),
            out_template.display().to_string(),
        ];
        if let Some(proxy) = proxy {
            args.push("--proxy".to_string());
            args.push(proxy.to_string());
        }
        if let Some(cookies) = cookies {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args.push(url);

        let output = tokio::time::timeout(
            SUBTITLE_TIMEOUT,
            tokio::process::Command::new(&self.bin).args(&args).output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                anyhow::bail!("failed to launch {} for {video_id}: {e}", self.bin);
            }
            Err(_) => {
                warn!(video_id, "Subtitle download timed out");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(video_id, stderr = %stderr, "Subtitle download exited with error");
            return Ok(None);
        }

        let Some(subtitle_file) = find_file(tmp_dir.path(), &["vtt", "srt"]) else {
            return Ok(None);
        };
        let raw = tokio::fs::read_to_string(&subtitle_file)
            .await
            .context("reading downloaded subtitle file")?;

        let segments = parse_subtitles(&raw);
        if segments.is_empty() {
            return Ok(None);
        }
        Ok(Some(segments))
    }

    /// Download best-available audio. The returned TempDir guard owns the
    /// file; keep it alive while the path is in use.
    pub async fn download_audio(
        &self,
        video_id: &str,
        proxy: Option<&str>,
        cookies: Option<&Path>,
    ) -> Result<Option<(TempDir, PathBuf)>> {
        let tmp_dir = tempfile::tempdir().context("creating audio temp dir")?;
        let out_template = tmp_dir.path().join("audio.%(ext)s");

        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let mut args: Vec<String> = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--output".to_string(),
            out_template.display().to_string(),
        ];
        if let Some(proxy) = proxy {
            args.push("--proxy".to_string());
            args.push(proxy.to_string());
        }
        if let Some(cookies) = cookies {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args.push(url);

        let output = tokio::time::timeout(
            AUDIO_TIMEOUT,
            tokio::process::Command::new(&self.bin).args(&args).output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                anyhow::bail!("failed to launch {} for {video_id}: {e}", self.bin);
            }
            Err(_) => {
                warn!(video_id, "Audio download timed out");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(video_id, stderr = %stderr, "Audio download exited with error");
            return Ok(None);
        }

        match find_file(tmp_dir.path(), AUDIO_EXTENSIONS) {
            Some(path) => Ok(Some((tmp_dir, path))),
            None => Ok(None),
        }
    }
}

fn find_file(dir: &Path, extensions: &[&str]) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if extensions.contains(&ext) {
                return Some(path);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Chain sources backed by yt-dlp
// ---------------------------------------------------------------------------

/// Subtitle scrape through a random proxy from the shared pool.
pub struct ProxyScrapeSource {
    client: YtdlpClient,
    proxies: Arc<ProxyPool>,
}

impl ProxyScrapeSource {
    pub fn new(client: YtdlpClient, proxies: Arc<ProxyPool>) -> Self {
        Self { client, proxies }
    }
}

#[async_trait]
impl TranscriptSource for ProxyScrapeSource {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        let Some(proxy) = self.proxies.pick().await else {
            warn!(video_id, "No proxies available, skipping proxy scrape");
            return Ok(None);
        };

        info!(video_id, proxy = %proxy, "Attempting proxy subtitle scrape");
        self.client
            .download_subtitles(video_id, Some(&proxy), None)
            .await
    }

    fn name(&self) -> &str {
        "proxy_scrape"
    }
}

/// Subtitle scrape with a stored browser-cookie file, for videos that need
/// an authenticated context.
pub struct CookieScrapeSource {
    client: YtdlpClient,
    cookies_file: PathBuf,
}

impl CookieScrapeSource {
    pub fn new(client: YtdlpClient, cookies_file: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cookies_file: cookies_file.into(),
        }
    }
}

#[async_trait]
impl TranscriptSource for CookieScrapeSource {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        if !self.cookies_file.exists() {
            warn!(video_id, "No cookies file present, skipping cookie scrape");
            return Ok(None);
        }

        info!(video_id, "Attempting cookie subtitle scrape");
        self.client
            .download_subtitles(video_id, None, Some(&self.cookies_file))
            .await
    }

    fn name(&self) -> &str {
        "cookie_scrape"
    }
}
