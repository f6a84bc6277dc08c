use brandlens_common::{ChannelDetails, ProductRef, TranscriptSegment, VideoMetadata};
use tracing::warn;

use crate::error::Result;
use crate::store::Store;

/// Resolved entity mentions for one video. Applying a set replaces whatever
/// the video had before, so re-ingesting never duplicates rows.
#[derive(Debug, Default, Clone)]
pub struct MentionSet {
    pub brands: Vec<EntityMention>,
    pub sponsors: Vec<EntityMention>,
    pub products: Vec<ProductMention>,
}

#[derive(Debug, Clone)]
pub struct EntityMention {
    pub entity_id: i64,
    pub sentiment_score: i64,
}

#[derive(Debug, Clone)]
pub struct ProductMention {
    pub product_id: i64,
    pub brand_id: Option<i64>,
    pub sentiment_score: i64,
}

/// Analysis snapshot stored on the video row.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub summary: String,
    pub sentiment: String,
    pub topics: Vec<String>,
    pub brands: Vec<String>,
    pub sponsors: Vec<String>,
    pub products: Vec<ProductRef>,
}

impl Store {
    /// Whether a video has already been ingested.
    pub async fn video_exists(&self, video_id: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM videos WHERE video_id = ?1",
        )
        .bind(video_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Insert or refresh a channel row. Logs a warning on failure rather than
    /// propagating; a stale channel row shouldn't abort video ingestion.
    pub async fn upsert_channel(&self, details: &ChannelDetails) {
        let result = sqlx::query(
            "INSERT INTO channels
                (channel_id, title, description, subscriber_count, video_count,
                 view_count, creation_date, thumbnail_url, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
             ON CONFLICT (channel_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                subscriber_count = excluded.subscriber_count,
                video_count = excluded.video_count,
                view_count = excluded.view_count,
                thumbnail_url = excluded.thumbnail_url,
                updated_at = datetime('now')",
        )
        .bind(&details.channel_id)
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.subscriber_count)
        .bind(details.video_count)
        .bind(details.view_count)
        .bind(details.creation_date.map(|d| d.to_rfc3339()))
        .bind(&details.thumbnail_url)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(channel_id = %details.channel_id, error = %e, "Failed to upsert channel");
        }
    }

    /// Persist a fully processed video in one transaction: metadata row,
    /// transcript segments, entity mentions, and dashboard invalidation.
    /// A crash mid-way leaves no partial state.
    pub async fn persist_video(
        &self,
        metadata: &VideoMetadata,
        analysis: &VideoAnalysis,
        segments: &[TranscriptSegment],
        mentions: &MentionSet,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO videos
                (video_id, channel_id, title, channel_title, published_at,
                 duration, view_count, like_count, thumbnail_url, tags_json,
                 category, overall_summary, overall_sentiment, topics_json,
                 brands_json, sponsors_json, products_json, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, datetime('now'))
             ON CONFLICT (video_id) DO UPDATE SET
                title = excluded.title,
                view_count = excluded.view_count,
                like_count = excluded.like_count,
                overall_summary = excluded.overall_summary,
                overall_sentiment = excluded.overall_sentiment,
                topics_json = excluded.topics_json,
                brands_json = excluded.brands_json,
                sponsors_json = excluded.sponsors_json,
                products_json = excluded.products_json,
                processed_at = datetime('now')",
        )
        .bind(&metadata.id)
        .bind(&metadata.channel_id)
        .bind(&metadata.title)
        .bind(&metadata.channel_title)
        .bind(metadata.published_at.map(|d| d.to_rfc3339()))
        .bind(&metadata.duration)
        .bind(metadata.view_count)
        .bind(metadata.like_count)
        .bind(&metadata.thumbnail_url)
        .bind(serde_json::to_string(&metadata.tags).unwrap_or_default())
        .bind(&metadata.category)
        .bind(&analysis.summary)
        .bind(&analysis.sentiment)
        .bind(serde_json::to_string(&analysis.topics).unwrap_or_default())
        .bind(serde_json::to_string(&analysis.brands).unwrap_or_default())
        .bind(serde_json::to_string(&analysis.sponsors).unwrap_or_default())
        .bind(serde_json::to_string(&analysis.products).unwrap_or_default())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM video_segments WHERE video_id = ?1")
            .bind(&metadata.id)
            .execute(&mut *tx)
            .await?;

        for (seq, segment) in segments.iter().enumerate() {
            sqlx::query(
                "INSERT INTO video_segments (video_id, seq, start_s, end_s, text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&metadata.id)
            .bind(seq as i64)
            .bind(segment.start)
            .bind(segment.end)
            .bind(&segment.text)
            .execute(&mut *tx)
            .await?;
        }

        // Mentions carry the upload date as first_seen_date; fall back to now
        // when the discovery collaborator had no publish timestamp.
        let first_seen = metadata
            .published_at
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339();

        sqlx::query("DELETE FROM brand_mentions WHERE video_id = ?1")
            .bind(&metadata.id)
            .execute(&mut *tx)
            .await?;
        for m in &mentions.brands {
            sqlx::query(
                "INSERT INTO brand_mentions
                    (video_id, channel_id, brand_id, mention_count, sentiment_score, first_seen_date)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            )
            .bind(&metadata.id)
            .bind(&metadata.channel_id)
            .bind(m.entity_id)
            .bind(m.sentiment_score)
            .bind(&first_seen)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sponsor_mentions WHERE video_id = ?1")
            .bind(&metadata.id)
            .execute(&mut *tx)
            .await?;
        for m in &mentions.sponsors {
            sqlx::query(
                "INSERT INTO sponsor_mentions
                    (video_id, channel_id, sponsor_id, mention_count, sentiment_score, first_seen_date)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            )
            .bind(&metadata.id)
            .bind(&metadata.channel_id)
            .bind(m.entity_id)
            .bind(m.sentiment_score)
            .bind(&first_seen)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM product_mentions WHERE video_id = ?1")
            .bind(&metadata.id)
            .execute(&mut *tx)
            .await?;
        for m in &mentions.products {
            sqlx::query(
                "INSERT INTO product_mentions
                    (video_id, channel_id, product_id, brand_id, mention_count,
                     sentiment_score, first_seen_date)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            )
            .bind(&metadata.id)
            .bind(&metadata.channel_id)
            .bind(m.product_id)
            .bind(m.brand_id)
            .bind(m.sentiment_score)
            .bind(&first_seen)
            .execute(&mut *tx)
            .await?;

            // Fresh mentions invalidate the product's dashboard snapshot.
            sqlx::query("DELETE FROM cached_dashboards WHERE cache_key = ?1")
                .bind(format!("product:{}:intel_v2", m.product_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
