//! OneBot V11 HTTP action-call envelope (§6 "Outbound API calls").
//!
//! A call is `POST {base_url}/{action}` with a JSON body of named
//! parameters; the response is always `{status, retcode, data, message?}`
//! regardless of which action was invoked.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope common to every OneBot V11 action call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    pub retcode: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok" || self.retcode == 0
    }
}

/// A single node in a `send_private_forward_msg` / `send_group_forward_msg`
/// call — `{type: "node", data: {user_id, nickname, content}}` per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardNode {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub data: ForwardNodeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardNodeData {
    pub user_id: i64,
    pub nickname: String,
    /// CQ-string content — custom forward nodes require the string form,
    /// not the segment-array form (see `qqbot-message::to_cq_string`).
    pub content: String,
}

impl ForwardNode {
    pub fn new(user_id: i64, nickname: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            node_type: "node",
            data: ForwardNodeData {
                user_id,
                nickname: nickname.into(),
                content: content.into(),
            },
        }
    }
}
