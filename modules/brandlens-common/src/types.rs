use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timed slice of transcript text. Offsets are seconds from video start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Per-video metadata returned by the discovery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    /// ISO 8601 duration string, e.g. "PT12M34S".
    pub duration: String,
    pub view_count: i64,
    pub like_count: i64,
    pub thumbnail_url: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
}

/// Channel-level details, upserted best-effort alongside each video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDetails {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub view_count: i64,
    pub creation_date: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
}

/// One product reference extracted from a transcript. Any field may be absent
/// when the transcript does not state it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub brand: Option<String>,
    pub product: Option<String>,
    pub category: Option<String>,
}

/// Aggregated output of a full extraction pass over one video's transcript.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub brands: Vec<String>,
    pub products: Vec<ProductRef>,
    pub sponsors: Vec<String>,
    pub topics: Vec<String>,
    pub summary: String,
    /// Free-text sentiment label ("Positive" / "Neutral" / "Negative").
    pub sentiment: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.products.is_empty() && self.sponsors.is_empty()
    }
}

/// Canonical-entity normalization: trim + lowercase.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Map a free-text sentiment label to the three-bucket 0-100 scale.
pub fn sentiment_score(sentiment: &str) -> i64 {
    let s = sentiment.to_lowercase();
    if s.contains("positive") {
        85
    } else if s.contains("negative") {
        15
    } else {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize_name("  MAYBELLINE "), "maybelline");
        assert_eq!(normalize_name("Fenty Beauty"), "fenty beauty");
    }

    #[test]
    fn sentiment_buckets() {
        assert_eq!(sentiment_score("Positive"), 85);
        assert_eq!(sentiment_score("very positive review"), 85);
        assert_eq!(sentiment_score("Negative"), 15);
        assert_eq!(sentiment_score("Neutral"), 50);
        assert_eq!(sentiment_score(""), 50);
    }
}
