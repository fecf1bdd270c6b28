use chrono::{DateTime, Utc};
use qqbot_llm::ChatMessage;

/// An in-progress agent dialogue, keyed by `"<bot_id>:<user_scope_id>"`.
#[derive(Debug, Clone)]
pub struct AgentSession {
    pub session_id: String,
    pub turns: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

/// Latest N turns submitted to the LLM per turn (§4.7/§4.8).
pub const TURN_HISTORY_LIMIT: usize = 15;

impl AgentSession {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self { session_id: uuid::Uuid::new_v4().to_string(), turns: Vec::new(), created_at }
    }

    pub fn push(&mut self, turn: ChatMessage) {
        self.turns.push(turn);
    }

    /// The last [`TURN_HISTORY_LIMIT`] turns, the view submitted to C8.
    pub fn recent_turns(&self) -> &[ChatMessage] {
        let start = self.turns.len().saturating_sub(TURN_HISTORY_LIMIT);
        &self.turns[start..]
    }
}

/// Shared session map, matching `skynet-gateway::AppState`'s
/// `DashMap`-for-shared-mutable-state idiom — every handler reads/writes
/// through this without an outer lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: dashmap::DashMap<String, AgentSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<AgentSession> {
        self.sessions.get(key).map(|entry| entry.clone())
    }

    /// Create a session for `key` if none exists; return `true` if a new
    /// session was created.
    pub fn create(&self, key: &str, created_at: DateTime<Utc>) -> bool {
        if self.sessions.contains_key(key) {
            return false;
        }
        self.sessions.insert(key.to_string(), AgentSession::new(created_at));
        true
    }

    pub fn with_mut<R>(&self, key: &str, f: impl FnOnce(&mut AgentSession) -> R) -> Option<R> {
        self.sessions.get_mut(key).map(|mut entry| f(&mut entry))
    }

    pub fn pop(&self, key: &str) -> Option<AgentSession> {
        self.sessions.remove(key).map(|(_, session)| session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_turns_trims_to_limit() {
        let mut session = AgentSession::new(Utc::now());
        for i in 0..20 {
            session.push(ChatMessage::user_text(format!("turn {i}")));
        }
        assert_eq!(session.recent_turns().len(), TURN_HISTORY_LIMIT);
        assert_eq!(session.recent_turns()[0], ChatMessage::user_text("turn 5"));
    }

    #[test]
    fn create_is_idempotent_for_existing_key() {
        let store = SessionStore::new();
        assert!(store.create("bot:1", Utc::now()));
        assert!(!store.create("bot:1", Utc::now()));
        assert!(store.has("bot:1"));
    }

    #[test]
    fn pop_removes_and_returns_session() {
        let store = SessionStore::new();
        store.create("bot:1", Utc::now());
        assert!(store.pop("bot:1").is_some());
        assert!(!store.has("bot:1"));
    }
}
