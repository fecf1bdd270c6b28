//! Gemini `generateContent` binding, built the way `OpenAiProvider` binds
//! to its REST endpoint: one `reqwest::Client`, a fixed request shape, and
//! lenient response parsing rather than failing the whole turn on a
//! malformed model reply.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;
use crate::types::{AiResponse, ChatMessage, Content, Role};

const SYSTEM_INSTRUCTION: &str = "\
You are an intent classifier for a task-automation assistant. Given the \
conversation so far, decide whether the user's request is concrete enough \
to dispatch to an automation backend. If the request is actionable and \
fully specified, set trigger_n8n to true and put the finalized, \
self-contained requirement description in payload. If it is ambiguous, \
incomplete, or purely conversational, set trigger_n8n to false, leave \
payload empty, and put a short clarifying question (or conversational \
reply) in response. Always answer with a single JSON object matching the \
required schema and nothing else.";

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "trigger_n8n": { "type": "BOOLEAN" },
            "payload": { "type": "STRING" },
            "response": { "type": "STRING" },
        },
        "required": ["trigger_n8n", "payload", "response"],
    })
}

#[derive(Debug)]
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(&self, turns: &[ChatMessage]) -> Result<AiResponse> {
        let contents: Vec<Value> = turns.iter().filter_map(turn_to_content).collect();

        let body = json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": contents,
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            },
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        debug!(turns = turns.len(), "calling gemini generateContent");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport { provider: "gemini", source: e })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { provider: "gemini", status: status.as_u16(), body });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transport { provider: "gemini", source: e })?;

        let raw_text = payload
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .and_then(|p| p.first())
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or_default();

        Ok(parse_ai_response(raw_text))
    }
}

/// Strip a ```json fence if present, decode, and fall back to surfacing
/// the raw text as a non-dispatching response on any parse failure.
fn parse_ai_response(raw_text: &str) -> AiResponse {
    let stripped = strip_json_fence(raw_text);
    match serde_json::from_str::<AiResponse>(stripped) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "gemini reply did not parse as structured JSON, surfacing raw text");
            AiResponse { trigger_n8n: false, payload: String::new(), response: raw_text.to_string() }
        }
    }
}

fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix("```json").or_else(|| trimmed.strip_prefix("```")).unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn turn_to_content(turn: &ChatMessage) -> Option<Value> {
    let role = match turn.role {
        Role::User => "user",
        Role::Assistant => "model",
    };

    let parts: Vec<Value> = turn.content.iter().filter_map(content_to_part).collect();
    if parts.is_empty() {
        return None;
    }

    Some(json!({ "role": role, "parts": parts }))
}

fn content_to_part(content: &Content) -> Option<Value> {
    match content {
        Content::Text { text } if !text.is_empty() => Some(json!({ "text": text })),
        Content::Text { .. } => None,
        Content::Image { url, filename } => Some(json!({
            "file_data": { "mime_type": infer_image_mime(filename), "file_uri": url },
        })),
        Content::Audio { base64_mp3 } => Some(json!({
            "inline_data": { "mime_type": "audio/mp3", "data": base64_mp3 },
        })),
    }
}

fn infer_image_mime(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
