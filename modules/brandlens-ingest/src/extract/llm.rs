//! Structured entity extraction over one transcript chunk.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use llm_client::{LlmClient, LlmError};

const SYSTEM_PROMPT: &str = "\
You are a strict text extraction engine.
You DO NOT infer, guess, expand, correct, or interpret meaning.
You only detect explicit brand, product, and sponsor names EXACTLY as written in the text.

Rules:
- Do NOT hallucinate or invent things that are not in the text.
- Do NOT merge, split, or normalise names beyond trimming whitespace.
- Do NOT infer brands from context.
- Only include names that appear literally in the text.
- Preserve casing as seen in the text.
- If something appears multiple times, list it once.
- If a product is mentioned without a clear brand, set brand to null.
- Sponsors are entities in phrases like \"sponsored by\", \"thanks to X for sponsoring\", \
\"in partnership with\".
- Topics are general discussion themes, e.g. \"makeup tutorial\", \"product review\".
- The summary is a short, factual, neutral summary of this text.
- Sentiment is exactly one of: Positive, Neutral, Negative.";

/// Schema-constrained output of one chunk-level extraction call.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ChunkExtraction {
    pub brands: Vec<String>,
    pub products: Vec<ChunkProduct>,
    pub sponsors: Vec<String>,
    pub topics: Vec<String>,
    pub summary: String,
    pub sentiment: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChunkProduct {
    pub brand: Option<String>,
    pub product: Option<String>,
    pub category: Option<String>,
}

/// Extraction seam. Mocked in tests; backed by the chat-completions client
/// in production.
#[async_trait]
pub trait ChunkExtractor: Send + Sync {
    async fn extract_chunk(&self, text: &str) -> Result<ChunkExtraction, LlmError>;
}

pub struct OpenAiChunkExtractor {
    client: LlmClient,
}

impl OpenAiChunkExtractor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChunkExtractor for OpenAiChunkExtractor {
    async fn extract_chunk(&self, text: &str) -> Result<ChunkExtraction, LlmError> {
        let user_prompt = format!(
            "Extract brands, products, sponsors, and topics explicitly mentioned in the \
             following transcript text, plus a short summary and overall sentiment.\n\n\
             TEXT:\n{text}\n\n\
             Remember:\n\
             - Only include names that appear literally in the text.\n\
             - Do NOT guess or invent anything.\n\
             - If a product has no clear brand, set \"brand\" to null."
        );

        debug!(chars = text.len(), "Extracting entities from chunk");
        self.client.extract(SYSTEM_PROMPT, user_prompt).await
    }
}
