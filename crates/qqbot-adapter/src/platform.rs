//! The platform-neutral capability seam (§4.3): everything that's
//! inherently OneBot-specific gets isolated behind this trait so the
//! engines above it never branch on gateway identity themselves. Mirrors
//! `Channel`/`ChannelManager`'s trait-object-by-name shape.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::OneBotClient;
use crate::error::{AdapterError, Result};

#[async_trait]
pub trait PlatformAdapter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Fetch a voice segment's audio and return it base64-encoded mp3.
    async fn extract_audio_base64(&self, file: &str) -> Result<String>;

    /// Forward an existing message by id to a private peer.
    async fn forward_to_peer(&self, user_id: i64, message_id: i64) -> Result<()>;

    /// Forward an existing message by id into a group.
    async fn forward_to_group(&self, group_id: i64, message_id: i64) -> Result<()>;

    /// The most recent message id in a group, or `None` if the history
    /// lookup fails or returns nothing.
    async fn fetch_group_latest_message_id(&self, group_id: i64) -> Option<i64>;
}

#[derive(Debug)]
pub struct OneBotV11Adapter {
    client: Arc<OneBotClient>,
}

impl OneBotV11Adapter {
    /// Shares the caller's client instance rather than owning a separate
    /// one, so `last_sent` stays a single process-wide value regardless
    /// of whether a call went through the adapter or the client directly.
    pub fn new(client: Arc<OneBotClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<OneBotClient> {
        &self.client
    }
}

#[async_trait]
impl PlatformAdapter for OneBotV11Adapter {
    fn name(&self) -> &str {
        "onebot_v11"
    }

    async fn extract_audio_base64(&self, file: &str) -> Result<String> {
        let data = self.client.get_record(file, "mp3").await?;
        data.get("base64")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AdapterError::Action {
                action: "get_record".to_string(),
                retcode: -1,
                message: "response missing base64 field".to_string(),
            })
    }

    async fn forward_to_peer(&self, user_id: i64, message_id: i64) -> Result<()> {
        self.client.forward_friend_single_msg(user_id, message_id).await?;
        Ok(())
    }

    async fn forward_to_group(&self, group_id: i64, message_id: i64) -> Result<()> {
        self.client.forward_group_single_msg(group_id, message_id).await?;
        Ok(())
    }

    async fn fetch_group_latest_message_id(&self, group_id: i64) -> Option<i64> {
        let history = self
            .client
            .get_group_msg_history(group_id, None, 1, true)
            .await
            .ok()?;
        history
            .get("messages")
            .and_then(|v| v.as_array())
            .and_then(|msgs| msgs.first())
            .and_then(|msg| msg.get("message_id"))
            .and_then(|id| id.as_i64())
    }
}

/// Selects a [`PlatformAdapter`] by the connected bot's adapter-identity
/// string. Only `onebot_v11` is registered today; other names raise
/// [`AdapterError::UnsupportedAdapter`] for the caller to turn into a
/// silent no-op or a user-facing message.
pub struct AdapterRouter {
    onebot: OneBotV11Adapter,
}

impl AdapterRouter {
    pub fn new(onebot: OneBotV11Adapter) -> Self {
        Self { onebot }
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn PlatformAdapter> {
        match name {
            "onebot_v11" => Ok(&self.onebot),
            other => Err(AdapterError::UnsupportedAdapter(other.to_string())),
        }
    }

    pub fn onebot(&self) -> &OneBotV11Adapter {
        &self.onebot
    }
}
