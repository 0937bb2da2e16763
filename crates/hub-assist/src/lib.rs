//! Generative-text assistant for Hustle Hub.
//!
//! The service is a stateless request/response collaborator: one prompt in,
//! one block of text out. It fails closed: callers of
//! [`TextGenerator::generate`] always get a displayable string, never an error.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

/// Returned when the service cannot be reached or answers with an error.
pub const FAILURE_FALLBACK: &str = "Failed to get a response from the AI.";

/// Returned when the service answers but produces no text.
pub const EMPTY_FALLBACK: &str = "Could not generate a response.";

/// Author label stamped on messages the assistant writes.
pub const AI_AUTHOR: &str = "Hustle Hub AI";

/// Error type for generation requests
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no candidates")]
    Empty,
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation request, surfacing failures.
    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Run one generation request, degrading to a fixed fallback string on
    /// any failure. Never retries.
    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(GenerationError::Empty) => EMPTY_FALLBACK.to_string(),
            Err(e) => {
                warn!("Generation failed: {}", e);
                FAILURE_FALLBACK.to_string()
            }
        }
    }
}
