//! Reply summarization (§4.4) — design-critical because reply bubbles are
//! lost once a message is re-rendered as a forward card, and because a
//! post-recall `get_msg` fetch for the quoted message often fails (the
//! quoted message may itself have just been recalled).

use crate::segment::Segment;

const SEPARATOR: &str = "────────────";
const UNKNOWN_SENDER: &str = "未知";
const UNRESOLVABLE: &str = "无法获取";

/// A quoted message's sender and content, already resolved by whichever
/// lookup succeeded.
#[derive(Debug, Clone)]
pub struct QuotedContent {
    pub sender_name: Option<String>,
    pub segments: Vec<Segment>,
}

/// Abstracts the three-way priority chain in §4.4: a caller-supplied local
/// lookup (used while expanding siblings inside the same forward batch), the
/// recall cache, and finally the gateway's `get_msg` action. Implementors
/// compose these in `resolve`'s default chain; override individual methods
/// to skip a tier that doesn't apply at a given call site.
pub trait ReplyResolver {
    fn local_lookup(&self, _reply_id: &str) -> Option<QuotedContent> {
        None
    }
    fn cache_lookup(&self, reply_id: &str) -> Option<QuotedContent>;
    fn gateway_lookup(&self, reply_id: &str) -> Option<QuotedContent>;

    /// Relative position of `target_id` above `current_id`, per C5's
    /// `offset_up`. `None` when either id is absent from the cache.
    fn offset_up(&self, current_id: &str, target_id: &str) -> Option<usize>;

    fn resolve(&self, reply_id: &str) -> Option<QuotedContent> {
        self.local_lookup(reply_id)
            .or_else(|| self.cache_lookup(reply_id))
            .or_else(|| self.gateway_lookup(reply_id))
    }
}

/// Resolve `reply_id` via `resolver`'s priority chain and build the full
/// prefix block (`回复(用户：{name})：{summary}` + separator line).
pub fn summarize_reply(reply_id: &str, current_id: &str, resolver: &dyn ReplyResolver) -> String {
    match resolver.resolve(reply_id) {
        Some(quoted) => summarize_quoted(&quoted, reply_id, current_id, resolver),
        None => build_prefix(None, UNRESOLVABLE),
    }
}

/// Build the prefix block from content the caller already resolved (the
/// gateway-attached "pre-resolved reply descriptor" case in C6's ingest
/// step 2) — still needs `resolver` for the image-offset lookup.
pub fn summarize_quoted(
    quoted: &QuotedContent,
    reply_id: &str,
    current_id: &str,
    resolver: &dyn ReplyResolver,
) -> String {
    let summary = summarize_segments(&quoted.segments, reply_id, current_id, resolver);
    build_prefix(quoted.sender_name.as_deref(), &summary)
}

fn build_prefix(sender_name: Option<&str>, summary: &str) -> String {
    let name = sender_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SENDER);
    format!("回复(用户：{name})：{summary}\n{SEPARATOR}\n")
}

fn summarize_segments(
    segments: &[Segment],
    reply_id: &str,
    current_id: &str,
    resolver: &dyn ReplyResolver,
) -> String {
    if segments.is_empty() {
        return UNRESOLVABLE.to_string();
    }

    let all_text = segments.iter().all(Segment::is_text);
    if all_text {
        return segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text { text } => Some(text.trim()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();
    }

    let all_image = segments.iter().all(Segment::is_image);
    if all_image {
        return match resolver.offset_up(current_id, reply_id) {
            Some(n) => format!("[图片：往上第{n}条]"),
            None => "[图片：往上第?条]".to_string(),
        };
    }

    let mixed = segments
        .iter()
        .all(|s| matches!(s, Segment::Text { .. } | Segment::Image { .. }));
    if mixed {
        return segments
            .iter()
            .map(|s| match s {
                Segment::Text { text } => text.trim().to_string(),
                Segment::Image { .. } => "[图片]".to_string(),
                _ => unreachable!("mixed branch only contains text/image"),
            })
            .collect::<Vec<_>>()
            .join("");
    }

    UNRESOLVABLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeResolver {
        cache: HashMap<String, QuotedContent>,
        offsets: HashMap<(String, String), usize>,
    }

    impl ReplyResolver for FakeResolver {
        fn cache_lookup(&self, reply_id: &str) -> Option<QuotedContent> {
            self.cache.get(reply_id).map(|q| QuotedContent {
                sender_name: q.sender_name.clone(),
                segments: q.segments.clone(),
            })
        }

        fn gateway_lookup(&self, _reply_id: &str) -> Option<QuotedContent> {
            None
        }

        fn offset_up(&self, current_id: &str, target_id: &str) -> Option<usize> {
            self.offsets
                .get(&(current_id.to_string(), target_id.to_string()))
                .copied()
        }
    }

    #[test]
    fn pure_text_reply_is_concatenated_and_trimmed() {
        let resolver = FakeResolver {
            cache: HashMap::from([(
                "1001".to_string(),
                QuotedContent {
                    sender_name: Some("Alice".to_string()),
                    segments: vec![Segment::text("  hi there  ")],
                },
            )]),
            offsets: HashMap::new(),
        };
        let out = summarize_reply("1001", "1003", &resolver);
        assert_eq!(out, "回复(用户：Alice)：hi there\n────────────\n");
    }

    #[test]
    fn pure_image_reply_uses_offset() {
        let resolver = FakeResolver {
            cache: HashMap::from([(
                "1001".to_string(),
                QuotedContent {
                    sender_name: Some("Alice".to_string()),
                    segments: vec![
                        Segment::Image { attrs: Default::default() },
                        Segment::Image { attrs: Default::default() },
                    ],
                },
            )]),
            offsets: HashMap::from([(("1003".to_string(), "1001".to_string()), 2usize)]),
        };
        let out = summarize_reply("1001", "1003", &resolver);
        assert_eq!(out, "回复(用户：Alice)：[图片：往上第2条]\n────────────\n");
    }

    #[test]
    fn pure_image_reply_falls_back_when_offset_unknown() {
        let resolver = FakeResolver {
            cache: HashMap::from([(
                "1001".to_string(),
                QuotedContent {
                    sender_name: Some("Alice".to_string()),
                    segments: vec![Segment::Image { attrs: Default::default() }],
                },
            )]),
            offsets: HashMap::new(),
        };
        let out = summarize_reply("1001", "1003", &resolver);
        assert!(out.starts_with("回复(用户：Alice)：[图片：往上第?条]"));
    }

    #[test]
    fn mixed_text_and_image_interleaves_placeholders() {
        let resolver = FakeResolver {
            cache: HashMap::from([(
                "1001".to_string(),
                QuotedContent {
                    sender_name: Some("Bob".to_string()),
                    segments: vec![
                        Segment::text("look "),
                        Segment::Image { attrs: Default::default() },
                    ],
                },
            )]),
            offsets: HashMap::new(),
        };
        let out = summarize_reply("1001", "1003", &resolver);
        assert_eq!(out, "回复(用户：Bob)：look[图片]\n────────────\n");
    }

    #[test]
    fn unresolvable_reply_uses_unknown_sender() {
        let resolver = FakeResolver { cache: HashMap::new(), offsets: HashMap::new() };
        let out = summarize_reply("9999", "1003", &resolver);
        assert_eq!(out, "回复(用户：未知)：无法获取\n────────────\n");
    }

    #[test]
    fn missing_sender_name_falls_back_to_unknown() {
        let resolver = FakeResolver {
            cache: HashMap::from([(
                "1001".to_string(),
                QuotedContent { sender_name: None, segments: vec![Segment::text("hi")] },
            )]),
            offsets: HashMap::new(),
        };
        let out = summarize_reply("1001", "1003", &resolver);
        assert!(out.starts_with("回复(用户：未知)："));
    }
}
