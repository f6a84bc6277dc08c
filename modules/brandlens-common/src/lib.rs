pub mod config;
pub mod error;
pub mod hash;
pub mod retry;
pub mod types;

pub use config::Config;
pub use error::IngestError;
pub use hash::transcript_hash;
pub use retry::RetryPolicy;
pub use types::{
    normalize_name, sentiment_score, ChannelDetails, ExtractionResult, ProductRef,
    TranscriptSegment, VideoMetadata,
};
