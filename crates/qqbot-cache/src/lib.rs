//! The recall cache (C5): a bounded FIFO with O(1) by-id lookup, sitting
//! behind a single `Mutex` the way `SessionManager` guards its in-memory
//! map — swapped from a SQLite connection to plain collections since this
//! component never touches disk.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use qqbot_message::Segment;

/// Maximum number of distinct messages the cache retains.
pub const CACHE_CAPACITY: usize = 100;

/// A group message, captured at ingest time with reply segments already
/// expanded to plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMessage {
    pub message_id: i64,
    pub group_id: i64,
    pub sender_user_id: i64,
    pub sender_display_name: String,
    pub segments: Vec<Segment>,
    pub forward_ids: Option<Vec<String>>,
    pub archived_message_id: Option<i64>,
}

#[derive(Default)]
struct CacheInner {
    order: VecDeque<i64>,
    entries: HashMap<i64, CachedMessage>,
}

/// Bounded FIFO recall cache, capacity [`CACHE_CAPACITY`].
pub struct RecallCache {
    inner: Mutex<CacheInner>,
}

impl Default for RecallCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecallCache {
    pub fn new() -> Self {
        Self { inner: Mutex::new(CacheInner::default()) }
    }

    /// Insert or replace a message, deduplicating by id: an existing id is
    /// first removed from the ordering so the re-put is treated as fresh,
    /// then evicts the oldest distinct entry if capacity is exceeded.
    pub fn put(&self, message: CachedMessage) {
        let mut inner = self.inner.lock().expect("recall cache poisoned");
        let id = message.message_id;

        if let Some(pos) = inner.order.iter().position(|existing| *existing == id) {
            inner.order.remove(pos);
        }
        inner.order.push_back(id);
        inner.entries.insert(id, message);

        while inner.order.len() > CACHE_CAPACITY {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn get(&self, message_id: i64) -> Option<CachedMessage> {
        let inner = self.inner.lock().expect("recall cache poisoned");
        inner.entries.get(&message_id).cloned()
    }

    pub fn remove(&self, message_id: i64) -> Option<CachedMessage> {
        let mut inner = self.inner.lock().expect("recall cache poisoned");
        if let Some(pos) = inner.order.iter().position(|existing| *existing == message_id) {
            inner.order.remove(pos);
        }
        inner.entries.remove(&message_id)
    }

    /// `offset = index(current) - index(target)`, treating a missing
    /// `current_id` as `len(queue)`. Returns `None` unless the offset is
    /// strictly positive (target absent, or not strictly above current).
    pub fn offset_up(&self, current_id: i64, target_id: i64) -> Option<usize> {
        let inner = self.inner.lock().expect("recall cache poisoned");
        let target_index = inner.order.iter().position(|id| *id == target_id)?;
        let current_index = inner
            .order
            .iter()
            .position(|id| *id == current_id)
            .unwrap_or(inner.order.len());
        let offset = current_index.checked_sub(target_index)?;
        (offset > 0).then_some(offset)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("recall cache poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64) -> CachedMessage {
        CachedMessage {
            message_id: id,
            group_id: 1,
            sender_user_id: 111,
            sender_display_name: "Alice".to_string(),
            segments: vec![Segment::text("hi")],
            forward_ids: None,
            archived_message_id: None,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = RecallCache::new();
        cache.put(message(1001));
        assert_eq!(cache.get(1001).unwrap().sender_display_name, "Alice");
    }

    #[test]
    fn overflow_evicts_oldest_distinct_entry() {
        let cache = RecallCache::new();
        for id in 1..=(CACHE_CAPACITY as i64 + 1) {
            cache.put(message(id));
        }
        assert_eq!(cache.len(), CACHE_CAPACITY);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(CACHE_CAPACITY as i64 + 1).is_some());
    }

    #[test]
    fn reput_of_existing_id_moves_to_tail_without_shrinking() {
        let cache = RecallCache::new();
        cache.put(message(1));
        cache.put(message(2));
        cache.put(message(1));
        assert_eq!(cache.len(), 2);
        // 1 is now the most recent; pushing CACHE_CAPACITY-1 more entries
        // should evict 2 first, not 1.
        for id in 3..(CACHE_CAPACITY as i64 + 2) {
            cache.put(message(id));
        }
        assert!(cache.get(2).is_none());
        assert!(cache.get(1).is_some());
    }

    #[test]
    fn offset_up_matches_invariant_example() {
        let cache = RecallCache::new();
        for id in [10, 20, 30, 40] {
            cache.put(message(id));
        }
        assert_eq!(cache.offset_up(40, 20), Some(2));
        assert_eq!(cache.offset_up(40, 40), None);
        assert_eq!(cache.offset_up(40, 99), None);
    }

    #[test]
    fn offset_up_treats_missing_current_as_queue_length() {
        let cache = RecallCache::new();
        for id in [10, 20, 30] {
            cache.put(message(id));
        }
        // current_id 999 is absent, treated as index 3 (len of queue).
        assert_eq!(cache.offset_up(999, 10), Some(3));
    }

    #[test]
    fn remove_drops_entry_and_ordering() {
        let cache = RecallCache::new();
        cache.put(message(1));
        cache.put(message(2));
        let removed = cache.remove(1);
        assert!(removed.is_some());
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 1);
    }
}
