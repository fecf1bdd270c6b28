use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One piece of a turn's content. A message with no usable parts (every
/// part dropped by the provider's translation step) is itself dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
    Image { url: String, filename: String },
    Audio { base64_mp3: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<Content>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![Content::Text { text: text.into() }] }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: vec![Content::Text { text: text.into() }] }
    }
}

/// The classifier's structured reply (§4.8). This rewrite commits to the
/// `{trigger_n8n, payload, response}` naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AiResponse {
    pub trigger_n8n: bool,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub response: String,
}
