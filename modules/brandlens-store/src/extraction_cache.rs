// Content-addressed extraction cache. A cached entry is valid only while the
// stored transcript hash matches the current transcript; otherwise the entry
// is stale and treated as a miss.

use brandlens_common::{ExtractionResult, ProductRef};
use tracing::warn;

use crate::error::Result;
use crate::store::Store;

#[derive(sqlx::FromRow)]
struct CacheRow {
    transcript_hash: String,
    brands_json: String,
    products_json: String,
    sponsors_json: String,
    topics_json: String,
    summary: String,
    sentiment: String,
}

impl Store {
    /// Look up a cached extraction for this video, valid for the given
    /// transcript hash. A malformed cached row is treated as a miss.
    pub async fn cached_extraction(
        &self,
        video_id: &str,
        transcript_hash: &str,
    ) -> Result<Option<ExtractionResult>> {
        let row = sqlx::query_as::<_, CacheRow>(
            "SELECT transcript_hash, brands_json, products_json, sponsors_json,
                    topics_json, summary, sentiment
             FROM video_extraction_cache
             WHERE video_id = ?1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        if row.transcript_hash != transcript_hash {
            return Ok(None);
        }

        let brands: std::result::Result<Vec<String>, _> = serde_json::from_str(&row.brands_json);
        let products: std::result::Result<Vec<ProductRef>, _> =
            serde_json::from_str(&row.products_json);
        let sponsors: std::result::Result<Vec<String>, _> =
            serde_json::from_str(&row.sponsors_json);
        let topics: std::result::Result<Vec<String>, _> = serde_json::from_str(&row.topics_json);

        match (brands, products, sponsors, topics) {
            (Ok(brands), Ok(products), Ok(sponsors), Ok(topics)) => Ok(Some(ExtractionResult {
                brands,
                products,
                sponsors,
                topics,
                summary: row.summary,
                sentiment: row.sentiment,
            })),
            _ => {
                warn!(video_id, "Malformed extraction cache entry, treating as miss");
                Ok(None)
            }
        }
    }

    /// Store (or overwrite) the extraction for a video at the given hash.
    pub async fn put_extraction(
        &self,
        video_id: &str,
        transcript_hash: &str,
        result: &ExtractionResult,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO video_extraction_cache
                (video_id, transcript_hash, brands_json, products_json,
                 sponsors_json, topics_json, summary, sentiment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
             ON CONFLICT (video_id) DO UPDATE SET
                transcript_hash = excluded.transcript_hash,
                brands_json = excluded.brands_json,
                products_json = excluded.products_json,
                sponsors_json = excluded.sponsors_json,
                topics_json = excluded.topics_json,
                summary = excluded.summary,
                sentiment = excluded.sentiment,
                created_at = datetime('now')",
        )
        .bind(video_id)
        .bind(transcript_hash)
        .bind(serde_json::to_string(&result.brands).unwrap_or_default())
        .bind(serde_json::to_string(&result.products).unwrap_or_default())
        .bind(serde_json::to_string(&result.sponsors).unwrap_or_default())
        .bind(serde_json::to_string(&result.topics).unwrap_or_default())
        .bind(&result.summary)
        .bind(&result.sentiment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
