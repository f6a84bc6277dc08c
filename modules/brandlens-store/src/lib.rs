//! SQLite persistence layer: channels, videos, transcript segments,
//! normalized entities (brands, sponsors, products), per-video mentions,
//! the content-addressed extraction cache and the ingestion audit log.

mod entities;
mod error;
mod extraction_cache;
mod ingest_log;
mod store;
mod videos;

pub use error::{Result, StoreError};
pub use store::Store;
pub use videos::{EntityMention, MentionSet, ProductMention, VideoAnalysis};
