//! Anti-recall engine (C6): caches every monitored group message and, on a
//! `notice.group_recall`, reconstructs and forwards it to the configured
//! target users.

pub mod engine;
pub mod error;
pub mod resolver;

pub use engine::AntiRecallEngine;
pub use error::{AntiRecallError, Result};
pub use resolver::CacheOffsetResolver;

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicI64;
    use std::sync::Arc;

    use qqbot_adapter::{AdapterRouter, OneBotV11Adapter};
    use qqbot_cache::{CachedMessage, RecallCache};
    use qqbot_config::ConfigStore;
    use qqbot_core::config::BotConfig;
    use qqbot_message::Segment;

    use super::*;

    fn self_id() -> Arc<AtomicI64> {
        Arc::new(AtomicI64::new(999))
    }

    fn test_adapters(client: Arc<qqbot_adapter::OneBotClient>) -> Arc<AdapterRouter> {
        Arc::new(AdapterRouter::new(OneBotV11Adapter::new(client)))
    }

    fn test_bot_config(monitor_groups: Vec<i64>, target_user_id: Vec<i64>, archive_group_id: Option<i64>) -> BotConfig {
        let mut cfg = BotConfig::default();
        cfg.anti_recall.monitor_groups = monitor_groups;
        cfg.anti_recall.target_user_id = target_user_id;
        cfg.anti_recall.archive_group_id = archive_group_id;
        cfg
    }

    fn test_config_store(enabled: bool) -> ConfigStore {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json"));
        store.set("plugins.anti_recall.enabled", enabled);
        store
    }

    #[test]
    fn should_monitor_requires_enabled_flag_group_membership_and_onebot_adapter() {
        let cache = Arc::new(RecallCache::new());
        let config_store = Arc::new(test_config_store(true));
        let bot_config = Arc::new(test_bot_config(vec![555], vec![1], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine = AntiRecallEngine::new(cache, config_store, bot_config, client, adapters, self_id());

        assert!(engine.should_monitor(555, "onebot_v11"));
        assert!(!engine.should_monitor(555, "discord"));
        assert!(!engine.should_monitor(1, "onebot_v11"));
    }

    #[test]
    fn should_monitor_is_false_when_flag_disabled() {
        let cache = Arc::new(RecallCache::new());
        let config_store = Arc::new(test_config_store(false));
        let bot_config = Arc::new(test_bot_config(vec![555], vec![1], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine = AntiRecallEngine::new(cache, config_store, bot_config, client, adapters, self_id());

        assert!(!engine.should_monitor(555, "onebot_v11"));
    }

    #[tokio::test]
    async fn recall_of_unknown_message_is_a_silent_noop() {
        let cache = Arc::new(RecallCache::new());
        let config_store = Arc::new(test_config_store(true));
        let bot_config = Arc::new(test_bot_config(vec![555], vec![1], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine = AntiRecallEngine::new(cache, config_store, bot_config, client, adapters, self_id());

        let notice = qqbot_protocol::GroupRecallNotice {
            group_id: 555,
            message_id: 42,
            user_id: 1,
            operator_id: 1,
        };
        // No cached entry exists; this must return without panicking or
        // touching the cache.
        engine.handle_group_recall(notice).await;
    }

    #[tokio::test]
    async fn message_in_unmonitored_group_is_never_cached() {
        let cache = Arc::new(RecallCache::new());
        let config_store = Arc::new(test_config_store(true));
        let bot_config = Arc::new(test_bot_config(vec![555], vec![1], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine =
            AntiRecallEngine::new(cache.clone(), config_store, bot_config, client, adapters, self_id());

        let event = qqbot_protocol::GroupMessageEvent {
            group_id: 1,
            message_id: 10,
            user_id: 7,
            sender: qqbot_protocol::Sender { user_id: 7, nickname: Some("Alice".to_string()), card: None },
            message: serde_json::json!("hi"),
            reply: None,
            extra: serde_json::Value::Null,
        };

        engine.handle_group_message(event).await.unwrap();
        assert!(cache.get(10).is_none());
    }

    #[tokio::test]
    async fn plain_text_message_in_monitored_group_is_cached_without_forward_ids() {
        let cache = Arc::new(RecallCache::new());
        let config_store = Arc::new(test_config_store(true));
        let bot_config = Arc::new(test_bot_config(vec![555], vec![1], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine =
            AntiRecallEngine::new(cache.clone(), config_store, bot_config, client, adapters, self_id());

        let event = qqbot_protocol::GroupMessageEvent {
            group_id: 555,
            message_id: 10,
            user_id: 7,
            sender: qqbot_protocol::Sender { user_id: 7, nickname: Some("Alice".to_string()), card: None },
            message: serde_json::json!("hello there"),
            reply: None,
            extra: serde_json::Value::Null,
        };

        engine.handle_group_message(event).await.unwrap();

        let cached = cache.get(10).expect("message should be cached");
        assert_eq!(cached.sender_display_name, "Alice");
        assert!(cached.forward_ids.is_none());
        assert!(cached.archived_message_id.is_none());
    }

    #[tokio::test]
    async fn recall_with_no_archive_configured_removes_cache_entry_without_output() {
        let cache = Arc::new(RecallCache::new());
        cache.put(CachedMessage {
            message_id: 42,
            group_id: 555,
            sender_user_id: 7,
            sender_display_name: "Alice".to_string(),
            segments: vec![Segment::text("hi")],
            forward_ids: Some(vec!["res123".to_string()]),
            archived_message_id: None,
        });
        let config_store = Arc::new(test_config_store(true));
        // No target users configured, so even the plain-message branch
        // (which this scenario never reaches) would be a no-op.
        let bot_config = Arc::new(test_bot_config(vec![555], vec![], None));
        let client = Arc::new(qqbot_adapter::OneBotClient::new("http://localhost:3000", None));
        let adapters = test_adapters(client.clone());
        let engine =
            AntiRecallEngine::new(cache.clone(), config_store, bot_config, client, adapters, self_id());

        let notice = qqbot_protocol::GroupRecallNotice {
            group_id: 555,
            message_id: 42,
            user_id: 7,
            operator_id: 1,
        };
        engine.handle_group_recall(notice).await;

        assert!(cache.get(42).is_none());
    }
}
