use qqbot_cache::RecallCache;
use qqbot_message::{QuotedContent, ReplyResolver};

/// Supplies [`qqbot_message::summarize_quoted`] with the offset lookup it
/// needs for the pure-image case. The actual cache/gateway priority chain
/// (§4.4) runs in `engine.rs` instead of through this trait's `resolve`,
/// because the gateway tier needs an awaited HTTP call and this trait's
/// methods are synchronous by design (the offset computation itself never
/// touches the network).
pub struct CacheOffsetResolver<'a> {
    pub cache: &'a RecallCache,
}

impl ReplyResolver for CacheOffsetResolver<'_> {
    fn cache_lookup(&self, _reply_id: &str) -> Option<QuotedContent> {
        None
    }

    fn gateway_lookup(&self, _reply_id: &str) -> Option<QuotedContent> {
        None
    }

    fn offset_up(&self, current_id: &str, target_id: &str) -> Option<usize> {
        let current: i64 = current_id.parse().ok()?;
        let target: i64 = target_id.parse().ok()?;
        self.cache.offset_up(current, target)
    }
}
