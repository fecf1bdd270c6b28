use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("llm call failed: {0}")]
    Llm(#[from] qqbot_llm::LlmError),

    #[error("automation backend rejected the requirement: {0}")]
    Webhook(#[from] qqbot_webhook::WebhookError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
