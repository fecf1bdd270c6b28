//! The automation webhook client (§4.9) — a single-purpose POST binding
//! built the same way `OpenAiProvider` builds its chat-completions call:
//! one client, one fixed body shape, bearer-style auth attached per-call.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("transport error posting requirement: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("automation backend returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, WebhookError>;

#[derive(Serialize)]
struct RequirementPayload<'a> {
    requirement: &'a str,
    session_id: &'a str,
}

pub struct WebhookClient {
    http: reqwest::Client,
    base_url: String,
    path: String,
    api_key: Option<String>,
}

impl WebhookClient {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder().timeout(TIMEOUT).build().unwrap_or_default(),
            base_url: base_url.into(),
            path: path.into(),
            api_key,
        }
    }

    pub async fn post_requirement(&self, requirement: &str, session_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), self.path.trim_start_matches('/'));
        debug!(%session_id, "posting finalized requirement to automation webhook");

        let mut request = self.http.post(&url).json(&RequirementPayload { requirement, session_id });
        if let Some(key) = &self.api_key {
            // Raw key, no scheme prefix — the gateway's webhook validates it
            // as an opaque shared secret, not as a Bearer token.
            request = request.header("Authorization", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Upstream { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_expected_keys() {
        let payload = RequirementPayload { requirement: "下载电影奥本海默", session_id: "abc123" };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["requirement"], "下载电影奥本海默");
        assert_eq!(value["session_id"], "abc123");
    }

    #[test]
    fn url_joins_base_and_path_without_double_slash() {
        let client = WebhookClient::new("https://n8n.example/", "/hooks/bot", None);
        let url = format!("{}/{}", client.base_url.trim_end_matches('/'), client.path.trim_start_matches('/'));
        assert_eq!(url, "https://n8n.example/hooks/bot");
    }
}
