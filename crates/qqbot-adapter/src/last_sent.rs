use chrono::{DateTime, Utc};
use serde_json::Value;

/// Diagnostic snapshot of the most recent action call, surfaced by the
/// `test send` debugging command. Process-wide single latest value — not a
/// history, just "what did we last try to do".
#[derive(Debug, Clone)]
pub struct LastSentRecord {
    pub time: DateTime<Utc>,
    pub api_name: String,
    pub target: String,
    pub payload: Value,
    pub ok: bool,
    pub exception: Option<String>,
}

/// Best-effort `group:<id>` / `user:<id>` descriptor pulled out of an
/// action's params object, for display purposes only.
pub fn target_descriptor(params: &Value) -> String {
    if let Some(id) = params.get("group_id").and_then(Value::as_i64) {
        return format!("group:{id}");
    }
    if let Some(id) = params.get("user_id").and_then(Value::as_i64) {
        return format!("user:{id}");
    }
    "unknown".to_string()
}
