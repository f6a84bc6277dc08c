//! Ingestion pipeline: channel discovery, transcript acquisition,
//! LLM entity extraction, and normalized persistence.

pub mod directory;
pub mod extract;
pub mod orchestrator;
pub mod transcript;

pub use orchestrator::{ChannelStats, IngestPipeline, IngestStatus};
