//! Entity extraction engine: chunked, parallel, cache-backed.

pub mod aggregate;
pub mod chunker;
pub mod llm;

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use brandlens_common::{transcript_hash, ExtractionResult, RetryPolicy, TranscriptSegment};
use brandlens_store::Store;
use llm_client::LlmError;

use aggregate::aggregate_chunks;
use chunker::{chunk_text, CHUNK_TARGET};
use llm::{ChunkExtraction, ChunkExtractor};

/// Concurrent chunk calls. Kept low to respect the shared per-account
/// rate limit while still overlapping latency.
const CHUNK_CONCURRENCY: usize = 2;

pub struct ExtractionEngine {
    store: Store,
    extractor: Arc<dyn ChunkExtractor>,
    retry: RetryPolicy,
}

impl ExtractionEngine {
    pub fn new(store: Store, extractor: Arc<dyn ChunkExtractor>) -> Self {
        Self {
            store,
            extractor,
            retry: RetryPolicy::rate_limit(),
        }
    }

    /// Extract entities for a video's transcript, consulting the
    /// content-addressed cache first. A cache hit issues zero LLM calls.
    pub async fn extract(
        &self,
        video_id: &str,
        segments: &[TranscriptSegment],
    ) -> Result<ExtractionResult> {
        // Input order is not trusted.
        let mut segments = segments.to_vec();
        segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

        let hash = transcript_hash(&segments);

        if let Some(cached) = self.store.cached_extraction(video_id, &hash).await? {
            info!(video_id, "Using cached extraction");
            return Ok(cached);
        }

        let full_text: String = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = chunk_text(&full_text, CHUNK_TARGET);
        info!(video_id, chunks = chunks.len(), "Extracting entities");

        let mut indexed: Vec<(usize, ChunkExtraction)> =
            stream::iter(chunks.iter().enumerate().map(|(i, chunk)| async move {
                let result = self
                    .retry
                    .run(|| self.extractor.extract_chunk(chunk), LlmError::is_rate_limit)
                    .await;
                match result {
                    Ok(extraction) => (i, extraction),
                    // A failed chunk degrades to empty rather than failing
                    // the whole video.
                    Err(e) => {
                        warn!(video_id, chunk = i, error = %e, "Chunk extraction failed");
                        (i, ChunkExtraction::default())
                    }
                }
            }))
            .buffer_unordered(CHUNK_CONCURRENCY)
            .collect()
            .await;

        // Aggregation is order-sensitive (first-seen casing, first-chunk
        // summary), so restore chunk order after the unordered fan-out.
        indexed.sort_by_key(|(i, _)| *i);
        let ordered: Vec<ChunkExtraction> = indexed.into_iter().map(|(_, c)| c).collect();

        let result = aggregate_chunks(&ordered);

        self.store.put_extraction(video_id, &hash, &result).await?;

        info!(
            video_id,
            brands = result.brands.len(),
            products = result.products.len(),
            sponsors = result.sponsors.len(),
            "Extraction complete"
        );
        Ok(result)
    }
}
