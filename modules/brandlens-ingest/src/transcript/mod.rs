//! Transcript acquisition chain.
//!
//! Sources are tried in a fixed order until one yields non-empty segments:
//! local cache, hosted captions API, proxy subtitle scrape, cookie subtitle
//! scrape, audio download plus speech-to-text. A source failure never stops
//! the chain; exhausting every source is a miss, not an error.

pub mod cache;
pub mod captions_api;
pub mod proxy;
pub mod subtitles;
pub mod whisper;
pub mod ytdlp;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use brandlens_common::{Config, TranscriptSegment};

use cache::TranscriptCache;
use captions_api::CaptionsApiSource;
use proxy::ProxyPool;
use whisper::SpeechToTextSource;
use ytdlp::{CookieScrapeSource, ProxyScrapeSource, YtdlpClient};

/// One acquisition source. `Ok(None)` is a miss; `Err` is a source-level
/// failure that the chain logs and steps past.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>>;
    fn name(&self) -> &str;
}

pub struct TranscriptChain {
    cache: TranscriptCache,
    sources: Vec<Box<dyn TranscriptSource>>,
}

impl TranscriptChain {
    pub fn new(cache: TranscriptCache, sources: Vec<Box<dyn TranscriptSource>>) -> Self {
        Self { cache, sources }
    }

    /// Build the full chain from configuration. Sources without credentials
    /// configured are left out rather than failing at fetch time.
    pub fn from_config(config: &Config, proxies: Arc<ProxyPool>) -> Self {
        let ytdlp = YtdlpClient::new(&config.ytdlp_bin);

        let mut sources: Vec<Box<dyn TranscriptSource>> = Vec::new();
        if let (Some(key), Some(host)) = (&config.captions_api_key, &config.captions_api_host) {
            sources.push(Box::new(CaptionsApiSource::new(key, host)));
        }
        sources.push(Box::new(ProxyScrapeSource::new(ytdlp.clone(), proxies)));
        sources.push(Box::new(CookieScrapeSource::new(
            ytdlp.clone(),
            &config.cookies_file,
        )));
        if let (Some(url), Some(key)) = (&config.whisper_api_url, &config.whisper_api_key) {
            sources.push(Box::new(SpeechToTextSource::new(ytdlp, url, key)));
        }

        Self::new(TranscriptCache::new(&config.transcript_cache_dir), sources)
    }

    /// Acquire a transcript for the video, consulting the cache first.
    /// Returns `Ok(None)` when every source comes up empty.
    pub async fn acquire(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        if let Some(segments) = self.cache.load(video_id).await {
            return Ok(Some(segments));
        }

        for source in &self.sources {
            match source.fetch(video_id).await {
                Ok(Some(segments)) if !segments.is_empty() => {
                    info!(
                        video_id,
                        source = source.name(),
                        count = segments.len(),
                        "Transcript acquired"
                    );
                    if let Err(e) = self.cache.save(video_id, &segments).await {
                        warn!(video_id, error = %e, "Failed to persist transcript cache");
                    }
                    return Ok(Some(segments));
                }
                Ok(_) => {
                    info!(video_id, source = source.name(), "Source had no transcript");
                }
                Err(e) => {
                    warn!(video_id, source = source.name(), error = %e, "Source failed");
                }
            }
        }

        info!(video_id, "All transcript sources exhausted");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct ScriptedSource {
        name: &'static str,
        calls: Arc<AtomicU32>,
        result: Option<Vec<TranscriptSegment>>,
        fail: bool,
    }

    #[async_trait]
    impl TranscriptSource for ScriptedSource {
        async fn fetch(&self, _video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("scripted failure");
            }
            Ok(self.result.clone())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn segments() -> Vec<TranscriptSegment> {
        vec![TranscriptSegment::new(0.0, 2.0, "Hi")]
    }

    #[tokio::test]
    async fn falls_through_to_next_source_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let first_calls = Arc::new(AtomicU32::new(0));
        let second_calls = Arc::new(AtomicU32::new(0));

        let chain = TranscriptChain::new(
            TranscriptCache::new(dir.path()),
            vec![
                Box::new(ScriptedSource {
                    name: "throttled",
                    calls: first_calls.clone(),
                    result: None,
                    fail: false,
                }),
                Box::new(ScriptedSource {
                    name: "working",
                    calls: second_calls.clone(),
                    result: Some(segments()),
                    fail: false,
                }),
            ],
        );

        let result = chain.acquire("vid1").await.unwrap();
        assert_eq!(result, Some(segments()));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn source_error_does_not_stop_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let chain = TranscriptChain::new(
            TranscriptCache::new(dir.path()),
            vec![
                Box::new(ScriptedSource {
                    name: "broken",
                    calls: Arc::new(AtomicU32::new(0)),
                    result: None,
                    fail: true,
                }),
                Box::new(ScriptedSource {
                    name: "working",
                    calls: Arc::new(AtomicU32::new(0)),
                    result: Some(segments()),
                    fail: false,
                }),
            ],
        );

        assert_eq!(chain.acquire("vid2").await.unwrap(), Some(segments()));
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_all_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::new(dir.path());
        cache.save("vid3", &segments()).await.unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let chain = TranscriptChain::new(
            TranscriptCache::new(dir.path()),
            vec![Box::new(ScriptedSource {
                name: "network",
                calls: calls.clone(),
                result: Some(segments()),
                fail: false,
            })],
        );

        assert_eq!(chain.acquire("vid3").await.unwrap(), Some(segments()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_acquisition_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let chain = TranscriptChain::new(
            TranscriptCache::new(dir.path()),
            vec![Box::new(ScriptedSource {
                name: "network",
                calls: calls.clone(),
                result: Some(segments()),
                fail: false,
            })],
        );

        chain.acquire("vid4").await.unwrap();
        chain.acquire("vid4").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let chain = TranscriptChain::new(
            TranscriptCache::new(dir.path()),
            vec![Box::new(ScriptedSource {
                name: "empty",
                calls: Arc::new(AtomicU32::new(0)),
                result: None,
                fail: false,
            })],
        );

        assert_eq!(chain.acquire("vid5").await.unwrap(), None);
    }
}
