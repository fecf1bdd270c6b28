use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AiResponse, ChatMessage};

/// Abstracts over LLM providers (§4.8). The initial (and only shipped)
/// implementation is [`crate::gemini::GeminiProvider`]; the router
/// dispatches on a configured provider name and fails explicitly on an
/// unknown one rather than silently falling back.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Classify the latest turn against the running history. `turns`
    /// arrives already tail-trimmed to the last 15 entries by the caller.
    async fn classify(&self, turns: &[ChatMessage]) -> Result<AiResponse>;
}
