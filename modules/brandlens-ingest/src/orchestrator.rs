//! Per-video and per-channel ingestion control flow.
//!
//! A video walks NEW -> METADATA_FETCHED -> TRANSCRIPT_ACQUIRED -> EXTRACTED
//! -> PERSISTED, or lands in one of the terminal failure states. Each
//! terminal outcome is appended to the ingestion log. One video's failure
//! never stops its siblings.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use brandlens_common::sentiment_score;
use brandlens_store::{EntityMention, MentionSet, ProductMention, Store, VideoAnalysis};

use crate::directory::VideoDirectory;
use crate::extract::ExtractionEngine;
use crate::transcript::TranscriptChain;

/// Concurrent video ingestions per channel.
const VIDEO_CONCURRENCY: usize = 4;

/// Terminal outcome of one video's ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Persisted,
    SkippedExisting,
    FailedMetadata,
    FailedTranscript,
    FailedPersist,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persisted => "PERSISTED",
            Self::SkippedExisting => "SKIPPED_EXISTING",
            Self::FailedMetadata => "FAILED_METADATA",
            Self::FailedTranscript => "FAILED_TRANSCRIPT",
            Self::FailedPersist => "FAILED_PERSIST",
        }
    }
}

/// Per-channel ingestion summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelStats {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct IngestPipeline {
    store: Store,
    directory: Arc<dyn VideoDirectory>,
    transcripts: TranscriptChain,
    extraction: ExtractionEngine,
    run_id: Uuid,
}

impl IngestPipeline {
    pub fn new(
        store: Store,
        directory: Arc<dyn VideoDirectory>,
        transcripts: TranscriptChain,
        extraction: ExtractionEngine,
    ) -> Self {
        Self {
            store,
            directory,
            transcripts,
            extraction,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Ingest one video end to end. Never returns an error; every failure
    /// mode maps to a terminal status and a log row.
    pub async fn ingest_video(&self, video_id: &str) -> IngestStatus {
        // Idempotent re-run guard.
        match self.store.video_exists(video_id).await {
            Ok(true) => {
                info!(video_id, "Already ingested, skipping");
                self.log(None, Some(video_id), IngestStatus::SkippedExisting, "exists", None)
                    .await;
                return IngestStatus::SkippedExisting;
            }
            Ok(false) => {}
            Err(e) => {
                error!(video_id, error = %e, "Existence check failed");
                self.log(
                    None,
                    Some(video_id),
                    IngestStatus::FailedPersist,
                    "exists",
                    Some(&e.to_string()),
                )
                .await;
                return IngestStatus::FailedPersist;
            }
        }

        let metadata = match self.directory.video_metadata(video_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(video_id, error = %e, "Metadata fetch failed");
                self.log(
                    None,
                    Some(video_id),
                    IngestStatus::FailedMetadata,
                    "metadata",
                    Some(&e.to_string()),
                )
                .await;
                return IngestStatus::FailedMetadata;
            }
        };
        let channel_id = metadata.channel_id.clone();

        let segments = match self.transcripts.acquire(video_id).await {
            Ok(Some(segments)) => segments,
            Ok(None) => {
                info!(video_id, "No transcript available, skipping");
                self.log(
                    Some(&channel_id),
                    Some(video_id),
                    IngestStatus::FailedTranscript,
                    "transcript",
                    None,
                )
                .await;
                return IngestStatus::FailedTranscript;
            }
            Err(e) => {
                warn!(video_id, error = %e, "Transcript acquisition failed");
                self.log(
                    Some(&channel_id),
                    Some(video_id),
                    IngestStatus::FailedTranscript,
                    "transcript",
                    Some(&e.to_string()),
                )
                .await;
                return IngestStatus::FailedTranscript;
            }
        };

        let extraction = match self.extraction.extract(video_id, &segments).await {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(video_id, error = %e, "Extraction failed");
                self.log(
                    Some(&channel_id),
                    Some(video_id),
                    IngestStatus::FailedPersist,
                    "extract",
                    Some(&e.to_string()),
                )
                .await;
                return IngestStatus::FailedPersist;
            }
        };

        // Channel row refresh is best-effort; a directory hiccup here must
        // not cost us the video.
        match self.directory.channel_details(&channel_id).await {
            Ok(details) => self.store.upsert_channel(&details).await,
            Err(e) => warn!(channel_id, error = %e, "Channel details fetch failed"),
        }

        let score = sentiment_score(&extraction.sentiment);
        let main_brand = extraction.brands.first().cloned();
        // Brands inherit the video's category; sponsors are always tagged
        // as such.
        let video_category = metadata.category.as_deref();

        let mut mentions = MentionSet::default();
        let mut persist_err: Option<String> = None;

        for brand in &extraction.brands {
            match self.store.upsert_brand(brand, video_category).await {
                Ok(id) => mentions.brands.push(EntityMention {
                    entity_id: id,
                    sentiment_score: score,
                }),
                Err(e) => {
                    persist_err = Some(e.to_string());
                    break;
                }
            }
        }

        if persist_err.is_none() {
            for sponsor in &extraction.sponsors {
                match self.store.upsert_sponsor(sponsor, Some("sponsor")).await {
                    Ok(id) => mentions.sponsors.push(EntityMention {
                        entity_id: id,
                        sentiment_score: score,
                    }),
                    Err(e) => {
                        persist_err = Some(e.to_string());
                        break;
                    }
                }
            }
        }

        if persist_err.is_none() {
            for product in &extraction.products {
                let Some(name) = product.product.as_deref().filter(|n| !n.trim().is_empty())
                else {
                    continue;
                };
                // A product with no explicit brand inherits the video's
                // leading brand, if any.
                let brand_hint = product.brand.clone().or_else(|| main_brand.clone());

                let brand_id = match &brand_hint {
                    Some(brand) => match self.store.upsert_brand(brand, video_category).await {
                        Ok(id) => Some(id),
                        Err(e) => {
                            persist_err = Some(e.to_string());
                            break;
                        }
                    },
                    None => None,
                };

                match self
                    .store
                    .upsert_product(name, brand_id, product.category.as_deref())
                    .await
                {
                    Ok(id) => mentions.products.push(ProductMention {
                        product_id: id,
                        brand_id,
                        sentiment_score: score,
                    }),
                    Err(e) => {
                        persist_err = Some(e.to_string());
                        break;
                    }
                }
            }
        }

        if let Some(err) = persist_err {
            error!(video_id, error = %err, "Entity upsert failed");
            self.log(
                Some(&channel_id),
                Some(video_id),
                IngestStatus::FailedPersist,
                "persist",
                Some(&err),
            )
            .await;
            return IngestStatus::FailedPersist;
        }

        let analysis = VideoAnalysis {
            summary: extraction.summary.clone(),
            sentiment: extraction.sentiment.clone(),
            topics: extraction.topics.clone(),
            brands: extraction.brands.clone(),
            sponsors: extraction.sponsors.clone(),
            products: extraction.products.clone(),
        };

        if let Err(e) = self
            .store
            .persist_video(&metadata, &analysis, &segments, &mentions)
            .await
        {
            error!(video_id, error = %e, "Persist failed, rolled back");
            self.log(
                Some(&channel_id),
                Some(video_id),
                IngestStatus::FailedPersist,
                "persist",
                Some(&e.to_string()),
            )
            .await;
            return IngestStatus::FailedPersist;
        }

        info!(
            video_id,
            brands = mentions.brands.len(),
            products = mentions.products.len(),
            "Video ingested"
        );
        self.log(Some(&channel_id), Some(video_id), IngestStatus::Persisted, "persist", None)
            .await;
        IngestStatus::Persisted
    }

    /// Ingest a channel's recent uploads with bounded parallelism. Per-video
    /// failures are counted, not propagated.
    pub async fn ingest_channel(&self, channel_id: &str, max_videos: usize) -> ChannelStats {
        let video_ids = match self.directory.recent_video_ids(channel_id, max_videos).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(channel_id, error = %e, "Failed to list channel videos");
                self.log(
                    Some(channel_id),
                    None,
                    IngestStatus::FailedMetadata,
                    "list_videos",
                    Some(&e.to_string()),
                )
                .await;
                return ChannelStats::default();
            }
        };

        info!(channel_id, count = video_ids.len(), "Ingesting channel");

        let statuses: Vec<IngestStatus> = stream::iter(
            video_ids
                .iter()
                .map(|video_id| self.ingest_video(video_id)),
        )
        .buffer_unordered(VIDEO_CONCURRENCY)
        .collect()
        .await;

        let mut stats = ChannelStats::default();
        for status in statuses {
            match status {
                IngestStatus::Persisted => stats.persisted += 1,
                IngestStatus::SkippedExisting => stats.skipped += 1,
                _ => stats.failed += 1,
            }
        }

        info!(
            channel_id,
            persisted = stats.persisted,
            skipped = stats.skipped,
            failed = stats.failed,
            "Channel ingestion complete"
        );
        stats
    }

    async fn log(
        &self,
        channel_id: Option<&str>,
        video_id: Option<&str>,
        status: IngestStatus,
        step: &str,
        error: Option<&str>,
    ) {
        self.store
            .log_ingest_step(self.run_id, channel_id, video_id, status.as_str(), step, error)
            .await;
    }
}
