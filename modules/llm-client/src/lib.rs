//! Chat-completions client with schema-constrained structured output.
//!
//! The extraction pipeline only ever needs one shape of call: a system
//! prompt, a user prompt, and a typed response. `LlmClient::extract`
//! covers that with strict JSON-schema response formatting so the model
//! cannot return fields the caller did not ask for.

mod client;
mod error;
mod schema;

pub use client::LlmClient;
pub use error::LlmError;
pub use schema::StructuredOutput;
