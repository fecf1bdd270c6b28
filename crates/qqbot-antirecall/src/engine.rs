//! The anti-recall engine (C6): ingest pipeline on every group message,
//! reaction pipeline on every recall notice. Modeled on
//! `skynet-hooks::engine::HookEngine`'s before/after shape with errors
//! swallowed at each step rather than aborting the handler.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use qqbot_adapter::{AdapterRouter, OneBotClient};
use qqbot_cache::{CachedMessage, RecallCache};
use qqbot_config::ConfigStore;
use qqbot_core::config::BotConfig;
use qqbot_message::{
    extract_forward_ids, normalize_content, summarize_quoted, to_cq_string, Message, QuotedContent,
    Segment,
};
use qqbot_protocol::{ForwardNode, GroupMessageEvent, GroupRecallNotice};

use crate::error::Result;
use crate::resolver::CacheOffsetResolver;

const ARCHIVE_SETTLE_DELAY: Duration = Duration::from_secs(1);
const TARGET_SEND_DELAY: Duration = Duration::from_secs(1);
const HEADER_NODE_NICKNAME: &str = "防撤回";

pub struct AntiRecallEngine {
    cache: Arc<RecallCache>,
    config_store: Arc<ConfigStore>,
    bot_config: Arc<BotConfig>,
    client: Arc<OneBotClient>,
    /// Platform-neutral capability seam (§4.3) used for the forward/archive
    /// moves below — kept distinct from `client` so those two calls stay
    /// routed through `PlatformAdapter` rather than the raw HTTP binding.
    adapters: Arc<AdapterRouter>,
    /// NapCat reports `self_id` on every inbound event rather than through
    /// a separate handshake, so this is updated as events arrive instead of
    /// being fixed at construction time.
    self_id: Arc<AtomicI64>,
}

impl AntiRecallEngine {
    pub fn new(
        cache: Arc<RecallCache>,
        config_store: Arc<ConfigStore>,
        bot_config: Arc<BotConfig>,
        client: Arc<OneBotClient>,
        adapters: Arc<AdapterRouter>,
        self_id: Arc<AtomicI64>,
    ) -> Self {
        Self { cache, config_store, bot_config, client, adapters, self_id }
    }

    /// Persisted enable flag, static group membership, and adapter
    /// identity all have to agree before this component does anything.
    pub fn should_monitor(&self, group_id: i64, adapter_name: &str) -> bool {
        if adapter_name != "onebot_v11" {
            return false;
        }
        let enabled = self.config_store.get::<bool>("plugins.anti_recall.enabled", false);
        enabled && self.bot_config.anti_recall.monitor_groups.contains(&group_id)
    }

    /// Six-step ingest pipeline. Never actually returns `Err` — every
    /// recoverable step degrades gracefully and is logged, matching §4.6's
    /// "the ingest itself never fails" invariant. The `Result` signature is
    /// kept so a future fallible step doesn't force a breaking change.
    pub async fn handle_group_message(&self, event: GroupMessageEvent) -> Result<()> {
        if !self.should_monitor(event.group_id, "onebot_v11") {
            return Ok(());
        }

        // 1. Convert to segments.
        let mut message = normalize_content(event.message.clone());

        // 2/3. Prepend a reply summary: prefer the gateway-attached
        // descriptor, otherwise expand any surviving `reply` segments.
        let current_id = event.message_id.to_string();
        if let Some(reply) = &event.reply {
            let quoted = QuotedContent {
                sender_name: reply.sender.display_name().map(str::to_string),
                segments: normalize_content(reply.message.clone()).into_segments(),
            };
            let prefix = summarize_quoted(&quoted, "", &current_id, &CacheOffsetResolver { cache: &self.cache });
            message = prepend_text(message, prefix);
        } else {
            message = self.expand_reply_segments(message, &current_id).await;
        }

        // 4. Extract outer-layer forward ids.
        let forward_ids = extract_forward_ids(message.segments());
        let forward_ids = if forward_ids.is_empty() { None } else { Some(forward_ids) };

        // 5. Conditionally archive opaque forwarded records.
        let archived_message_id = if forward_ids.is_some() {
            self.archive_if_configured(event.group_id, event.message_id).await
        } else {
            None
        };

        // 6. Commit to the recall cache.
        self.cache.put(CachedMessage {
            message_id: event.message_id,
            group_id: event.group_id,
            sender_user_id: event.user_id,
            sender_display_name: event.sender.display_name().unwrap_or("未知").to_string(),
            segments: message.into_segments(),
            forward_ids,
            archived_message_id,
        });

        Ok(())
    }

    async fn expand_reply_segments(&self, message: Message, current_id: &str) -> Message {
        let mut expanded = Vec::with_capacity(message.segments().len());
        for segment in message.into_segments() {
            match segment {
                Segment::Reply { id } => {
                    let quoted = self.resolve_quoted(&id).await;
                    let prefix =
                        summarize_quoted(&quoted, &id, current_id, &CacheOffsetResolver { cache: &self.cache });
                    expanded.push(Segment::text(prefix));
                }
                other => expanded.push(other),
            }
        }
        Message::new(expanded)
    }

    /// Priority chain: recall cache, then the gateway's `get_msg`. The
    /// "caller-supplied local lookup" tier from §4.4 applies inside
    /// forward expansion, which this engine does not perform (forward
    /// bodies stay opaque per the archive-group design).
    async fn resolve_quoted(&self, reply_id: &str) -> QuotedContent {
        if let Ok(id) = reply_id.parse::<i64>() {
            if let Some(cached) = self.cache.get(id) {
                return QuotedContent {
                    sender_name: Some(cached.sender_display_name),
                    segments: cached.segments,
                };
            }

            if let Ok(data) = self.client.get_msg(id).await {
                if let Some(segments) = data.get("message").cloned() {
                    let sender_name = data
                        .get("sender")
                        .and_then(|s| s.get("card").or_else(|| s.get("nickname")))
                        .and_then(|n| n.as_str())
                        .map(str::to_string);
                    return QuotedContent {
                        sender_name,
                        segments: normalize_content(segments).into_segments(),
                    };
                }
            }
        }

        QuotedContent { sender_name: None, segments: Vec::new() }
    }

    async fn archive_if_configured(&self, group_id: i64, message_id: i64) -> Option<i64> {
        let archive_group_id = self.bot_config.anti_recall.archive_group_id?;
        if archive_group_id == group_id {
            return None;
        }

        let adapter = self.adapters.resolve("onebot_v11").ok()?;

        if let Err(e) = adapter.forward_to_group(archive_group_id, message_id).await {
            warn!(error = %e, "failed to archive opaque forward, archived_message_id will be none");
            return None;
        }

        sleep(ARCHIVE_SETTLE_DELAY).await;

        adapter.fetch_group_latest_message_id(archive_group_id).await
    }

    /// Five-step reaction pipeline.
    pub async fn handle_group_recall(&self, notice: GroupRecallNotice) {
        let Some(cached) = self.cache.get(notice.message_id) else { return };

        let header = format!(
            "群号: {}\n发送者: {}({})\n撤回消息ID: {}\n",
            cached.group_id, cached.sender_display_name, cached.sender_user_id, notice.message_id
        );

        let targets = self.bot_config.anti_recall.target_user_id.clone();

        if let Some(forward_ids) = &cached.forward_ids {
            if !forward_ids.is_empty() {
                if let Some(archived_id) = cached.archived_message_id {
                    for target in &targets {
                        self.deliver_archived(*target, &header, archived_id).await;
                    }
                }
                // No archive configured / resolved: nothing to send, but
                // the cache entry is still removed below.
                self.cache.remove(notice.message_id);
                return;
            }
        }

        let cq_content = to_cq_string(&cached.segments);
        for target in &targets {
            self.deliver_plain(*target, &header, &cached, &cq_content).await;
        }

        self.cache.remove(notice.message_id);
    }

    async fn deliver_archived(&self, target: i64, header: &str, archived_id: i64) {
        if let Err(e) = self.client.send_private_msg(target, header).await {
            warn!(error = %e, target, "failed to send recall header");
            return;
        }
        sleep(TARGET_SEND_DELAY).await;

        let Ok(adapter) = self.adapters.resolve("onebot_v11") else {
            warn!(target, "no adapter registered for onebot_v11, cannot forward archived message");
            return;
        };
        if let Err(e) = adapter.forward_to_peer(target, archived_id).await {
            warn!(error = %e, target, "failed to forward archived message to target");
            return;
        }
        sleep(TARGET_SEND_DELAY).await;

        if let Err(e) = self.client.delete_msg(archived_id).await {
            warn!(error = %e, archived_id, "failed to clean up archived copy");
        }
    }

    async fn deliver_plain(&self, target: i64, header: &str, cached: &CachedMessage, cq_content: &str) {
        let nodes = vec![
            ForwardNode::new(self.self_id.load(Ordering::Relaxed), HEADER_NODE_NICKNAME, header),
            ForwardNode::new(cached.sender_user_id, cached.sender_display_name.clone(), cq_content),
        ];

        if self.client.send_private_forward_msg(target, &nodes).await.is_ok() {
            return;
        }

        let fallback_text = format!("{header}{cq_content}");
        if let Err(e) = self.client.send_private_msg(target, fallback_text).await {
            warn!(error = %e, target, "failed to deliver fallback text after forward-card failure");
        }
    }
}

fn prepend_text(message: Message, text: String) -> Message {
    let mut segments = Vec::with_capacity(message.segments().len() + 1);
    segments.push(Segment::text(text));
    segments.extend(message.into_segments());
    Message::new(segments)
}
