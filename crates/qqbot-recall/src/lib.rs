//! Self-delete (C10, §4.10): `/recall <count> [group_id]` walks the bot's
//! own recent history and deletes it, batch by batch, with a rate-limit
//! pause between deletes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use qqbot_adapter::OneBotClient;

/// Window beyond which a message is considered too old to self-delete.
const EXPIRY_WINDOW_SECS: i64 = 100;
/// Maximum number of progressively-larger batch re-fetches.
const MAX_BATCH_REFRESHES: u32 = 5;
/// Pause between individual delete calls, to respect gateway rate limits.
const DELETE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum RecallError {
    #[error(transparent)]
    Adapter(#[from] qqbot_adapter::AdapterError),
}

pub type Result<T> = std::result::Result<T, RecallError>;

/// Where to walk history: the originating group or friend, or an explicit
/// override from the command's `group_id` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallContext {
    Group(i64),
    Friend(i64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelfDeleteReport {
    pub deleted: Vec<i64>,
    /// `true` if the walk stopped because it hit a message older than
    /// [`EXPIRY_WINDOW_SECS`], rather than collecting a full `count`.
    pub hit_expiry: bool,
}

pub struct SelfDeleteExecutor {
    client: Arc<OneBotClient>,
}

impl SelfDeleteExecutor {
    pub fn new(client: Arc<OneBotClient>) -> Self {
        Self { client }
    }

    pub async fn recall_own_messages(
        &self,
        ctx: RecallContext,
        self_id: i64,
        count: u32,
    ) -> Result<SelfDeleteReport> {
        let now = Utc::now().timestamp();
        let mut collected: Vec<i64> = Vec::new();
        let mut hit_expiry = false;

        for loop_cnt in 0..MAX_BATCH_REFRESHES {
            let batch_size = (loop_cnt as i64 + 1) * count as i64;
            let history = self.fetch_history(ctx, batch_size).await?;
            let messages = history.get("messages").and_then(|v| v.as_array()).cloned().unwrap_or_default();

            collected.clear();
            hit_expiry = false;

            for message in &messages {
                let user_id = message.get("user_id").and_then(|v| v.as_i64());
                if user_id != Some(self_id) {
                    continue;
                }
                if message_is_empty(message) {
                    continue;
                }

                let time = message.get("time").and_then(|v| v.as_i64()).unwrap_or(now);
                if now - time > EXPIRY_WINDOW_SECS {
                    hit_expiry = true;
                    break;
                }

                if let Some(id) = message.get("message_id").and_then(|v| v.as_i64()) {
                    collected.push(id);
                    if collected.len() >= count as usize {
                        break;
                    }
                }
            }

            if hit_expiry || collected.len() >= count as usize {
                break;
            }

            // A batch shorter than requested means there's no more history
            // to find — stop refreshing rather than looping to the cap.
            if (messages.len() as i64) < batch_size {
                break;
            }
        }

        collected.truncate(count as usize);

        for (i, id) in collected.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(DELETE_INTERVAL).await;
            }
            if let Err(e) = self.client.delete_msg(*id).await {
                warn!(message_id = %id, error = %e, "failed to delete own message during self-delete");
            }
        }

        Ok(SelfDeleteReport { deleted: collected, hit_expiry })
    }

    async fn fetch_history(&self, ctx: RecallContext, count: i64) -> Result<serde_json::Value> {
        let history = match ctx {
            RecallContext::Group(group_id) => {
                self.client.get_group_msg_history(group_id, None, count, true).await?
            }
            RecallContext::Friend(user_id) => {
                self.client.get_friend_msg_history(user_id, None, count, true).await?
            }
        };
        Ok(history)
    }
}

fn message_is_empty(message: &serde_json::Value) -> bool {
    let raw = message.get("raw_message").and_then(|v| v.as_str());
    if let Some(raw) = raw {
        return raw.trim().is_empty();
    }
    match message.get("message") {
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(serde_json::Value::Array(arr)) => arr.is_empty(),
        _ => true,
    }
}
