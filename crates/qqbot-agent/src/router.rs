use std::sync::Arc;

use chrono::Utc;
use qqbot_llm::{ChatMessage, LlmProvider};
use qqbot_webhook::WebhookClient;
use tracing::warn;

use crate::error::Result;
use crate::session::SessionStore;

/// The result of feeding a turn through the agent pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome {
    /// A session was opened with no turn processed yet (`/a` with no
    /// argument) — see DESIGN.md's Open Question resolution on this.
    Opened,
    /// The LLM asked a clarifying question; the session stays open.
    Clarify { text: String },
    /// The requirement was dispatched to the automation webhook and the
    /// session was popped.
    Dispatched,
    /// The webhook rejected the requirement; the session stays open for
    /// the user to retry.
    DispatchFailed { message: String },
    /// The sender has no live session — not this component's concern.
    NotIntercepted,
}

pub struct AgentRouter {
    store: SessionStore,
    llm: Arc<dyn LlmProvider>,
    webhook: WebhookClient,
}

impl AgentRouter {
    pub fn new(llm: Arc<dyn LlmProvider>, webhook: WebhookClient) -> Self {
        Self { store: SessionStore::new(), llm, webhook }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open (or reuse) the session for `key`. With non-empty
    /// `opening_text`, that text becomes the first user turn and is
    /// processed immediately.
    pub async fn open(&self, key: &str, opening_text: Option<String>) -> Result<RouterOutcome> {
        self.store.create(key, Utc::now());

        match opening_text {
            Some(text) if !text.trim().is_empty() => {
                self.process_turn(key, ChatMessage::user_text(&text)).await
            }
            _ => Ok(RouterOutcome::Opened),
        }
    }

    /// Claim a message for an already-open session and process it as the
    /// next turn. Returns [`RouterOutcome::NotIntercepted`] if the sender
    /// has no live session.
    pub async fn intercept(&self, key: &str, turn: ChatMessage) -> Result<RouterOutcome> {
        if !self.store.has(key) {
            return Ok(RouterOutcome::NotIntercepted);
        }
        self.process_turn(key, turn).await
    }

    async fn process_turn(&self, key: &str, turn: ChatMessage) -> Result<RouterOutcome> {
        self.store.with_mut(key, |session| session.push(turn));

        let turns = match self.store.get(key) {
            Some(session) => session.recent_turns().to_vec(),
            None => return Ok(RouterOutcome::NotIntercepted),
        };

        let reply = self.llm.classify(&turns).await?;

        if reply.trigger_n8n {
            let session_id = self.store.get(key).map(|s| s.session_id).unwrap_or_default();
            match self.webhook.post_requirement(&reply.payload, &session_id).await {
                Ok(()) => {
                    self.store.pop(key);
                    Ok(RouterOutcome::Dispatched)
                }
                Err(e) => {
                    warn!(error = %e, %session_id, "automation webhook rejected requirement, session left open");
                    Ok(RouterOutcome::DispatchFailed { message: e.to_string() })
                }
            }
        } else {
            self.store.with_mut(key, |session| session.push(ChatMessage::assistant_text(&reply.response)));
            Ok(RouterOutcome::Clarify { text: reply.response })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qqbot_llm::AiResponse;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedProvider {
        replies: Mutex<Vec<AiResponse>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn classify(&self, _turns: &[ChatMessage]) -> qqbot_llm::Result<AiResponse> {
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    fn router_with(replies: Vec<AiResponse>) -> AgentRouter {
        let provider = Arc::new(ScriptedProvider { replies: Mutex::new(replies) });
        let webhook = WebhookClient::new("http://127.0.0.1:0", "hook", None);
        AgentRouter::new(provider, webhook)
    }

    #[tokio::test]
    async fn opening_with_no_text_just_opens() {
        let router = router_with(vec![]);
        let outcome = router.open("bot:1", None).await.unwrap();
        assert_eq!(outcome, RouterOutcome::Opened);
        assert!(router.store().has("bot:1"));
    }

    #[tokio::test]
    async fn opening_with_text_processes_first_turn_as_clarify() {
        let router = router_with(vec![AiResponse {
            trigger_n8n: false,
            payload: String::new(),
            response: "请问您想下载什么？".to_string(),
        }]);
        let outcome = router.open("bot:1", Some("下载".to_string())).await.unwrap();
        assert_eq!(outcome, RouterOutcome::Clarify { text: "请问您想下载什么？".to_string() });
        let session = router.store().get("bot:1").unwrap();
        assert_eq!(session.turns.len(), 2);
    }

    #[tokio::test]
    async fn intercept_without_session_is_not_intercepted() {
        let router = router_with(vec![]);
        let outcome = router.intercept("bot:2", ChatMessage::user_text("hi")).await.unwrap();
        assert_eq!(outcome, RouterOutcome::NotIntercepted);
    }
}
