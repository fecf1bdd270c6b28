//! Inbound OneBot V11 event shapes (§6 "Inbound events consumed").
//!
//! These mirror the gateway's JSON as closely as useful for this bot: only
//! the fields the core components actually read are named; anything else
//! arriving on the wire is preserved in `extra` so a future component can
//! reach for it without a breaking schema change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `sender` sub-object common to group and private message events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: i64,
    pub nickname: Option<String>,
    /// Group-card display name — preferred over `nickname` when present
    /// and non-empty (see `qqbot-message`'s sender-name resolution).
    pub card: Option<String>,
}

impl Sender {
    /// Group-card name if non-empty, else nickname, else `None`.
    pub fn display_name(&self) -> Option<&str> {
        self.card
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.nickname.as_deref())
    }
}

/// A gateway-attached quoted-message descriptor, present on some group
/// message events when the gateway has already resolved the reply for us
/// (step 2 of the C6 ingest pipeline — "more reliable than post-hoc lookups").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyInfo {
    pub sender: Sender,
    pub message: Value,
}

/// `message.group` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageEvent {
    pub group_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub sender: Sender,
    /// Either a segment array or a CQ-string — normalized by `qqbot-message`.
    pub message: Value,
    #[serde(default)]
    pub reply: Option<ReplyInfo>,
    #[serde(flatten)]
    pub extra: Value,
}

/// `message.private` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessageEvent {
    pub user_id: i64,
    pub message_id: i64,
    pub sender: Sender,
    pub message: Value,
    #[serde(flatten)]
    pub extra: Value,
}

/// `notice.group_recall` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecallNotice {
    pub group_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub operator_id: i64,
}

/// Top-level discriminant used to route a raw inbound frame before
/// deserializing into one of the concrete event types above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub post_type: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub notice_type: Option<String>,
    #[serde(flatten)]
    pub rest: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_card() {
        let s = Sender {
            user_id: 1,
            nickname: Some("nick".into()),
            card: Some("card".into()),
        };
        assert_eq!(s.display_name(), Some("card"));
    }

    #[test]
    fn display_name_falls_back_to_nickname_when_card_blank() {
        let s = Sender {
            user_id: 1,
            nickname: Some("nick".into()),
            card: Some("   ".into()),
        };
        assert_eq!(s.display_name(), Some("nick"));
    }
}
