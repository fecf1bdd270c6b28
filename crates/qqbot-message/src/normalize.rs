//! §4.4 `normalize_content` / `normalize_sendable`: callers hand this crate
//! everything from a plain string to a pre-built segment array to a raw
//! JSON blob pulled off the wire, and expect a [`Message`] back.

use serde_json::Value;

use crate::cq::parse_cq_string;
use crate::segment::{Message, Segment, SegmentRecord};

const EMPTY_CONTENT_PLACEHOLDER: &str = "（空内容）";

/// Coerce arbitrary content into a [`Message`], never failing: anything
/// that doesn't parse as a recognizable shape becomes its `to_string()`
/// rendered as a single text segment, and empty input becomes the
/// placeholder segment so downstream code never has to special-case "no
/// content" separately from "one empty text segment".
///
/// A string arg is CQ-encoded per §4.4, not literal text — a
/// CQ-string-mode gateway sends `message` this way, so `[CQ:image,...]`
/// and friends have to go through the same codec as the array form.
pub fn normalize_content(content: Value) -> Message {
    let message = match content {
        Value::Null => Message::new(vec![]),
        Value::String(s) => parse_cq_string(&s),
        Value::Array(items) => Message::new(items.into_iter().map(normalize_one).collect()),
        Value::Object(_) => Message::new(vec![normalize_one(content)]),
        other => Message::new(vec![Segment::text(other.to_string())]),
    };

    if message.segments().is_empty() || message.plain_text_is_blank_only() {
        return Message::new(vec![Segment::text(EMPTY_CONTENT_PLACEHOLDER)]);
    }
    message
}

fn normalize_one(value: Value) -> Segment {
    match value {
        Value::String(s) => Segment::text(s),
        Value::Object(map) => {
            if let Some(Value::String(kind)) = map.get("type") {
                let attributes = map
                    .get("data")
                    .and_then(|v| v.as_object())
                    .cloned()
                    .unwrap_or_else(|| map.clone());
                Segment::from_record(SegmentRecord {
                    kind: kind.clone(),
                    attributes: attributes.into_iter().collect(),
                })
            } else {
                // Segment-shaped map without an explicit `type` discriminant:
                // treat the whole map as an unknown segment's attributes.
                Segment::Unknown {
                    kind: "unknown".to_string(),
                    attrs: map.into_iter().collect(),
                }
            }
        }
        other => Segment::text(other.to_string()),
    }
}

/// Before handing a message to an adapter's send call, copy `url` into
/// `file` for media segments that carry one but not the other — some
/// OneBot implementations only accept `file`, others only populate `url`.
pub fn normalize_sendable(message: Message) -> Message {
    Message::new(message.into_segments().into_iter().map(fill_file_from_url).collect())
}

fn fill_file_from_url(segment: Segment) -> Segment {
    match segment {
        Segment::Image { mut attrs } => {
            copy_url_into_file(&mut attrs);
            Segment::Image { attrs }
        }
        Segment::Video { mut attrs } => {
            copy_url_into_file(&mut attrs);
            Segment::Video { attrs }
        }
        Segment::File { mut attrs } => {
            copy_url_into_file(&mut attrs);
            Segment::File { attrs }
        }
        other => other,
    }
}

fn copy_url_into_file(attrs: &mut std::collections::BTreeMap<String, Value>) {
    if !attrs.contains_key("file") {
        if let Some(url) = attrs.get("url").cloned() {
            attrs.insert("file".to_string(), url);
        }
    }
}

impl Message {
    fn plain_text_is_blank_only(&self) -> bool {
        !self.segments().is_empty()
            && self.segments().iter().all(|s| matches!(s, Segment::Text { text } if text.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_becomes_single_text_segment() {
        let msg = normalize_content(json!("hello"));
        assert_eq!(msg.segments(), &[Segment::text("hello")]);
    }

    #[test]
    fn cq_encoded_string_is_parsed_into_segments() {
        let msg = normalize_content(json!("hi[CQ:at,qq=123]bye"));
        assert_eq!(
            msg.segments(),
            &[
                Segment::text("hi"),
                Segment::At { qq: "123".to_string() },
                Segment::text("bye"),
            ]
        );
    }

    #[test]
    fn null_becomes_placeholder() {
        let msg = normalize_content(Value::Null);
        assert_eq!(msg.segments(), &[Segment::text(EMPTY_CONTENT_PLACEHOLDER)]);
    }

    #[test]
    fn blank_text_becomes_placeholder() {
        let msg = normalize_content(json!("   "));
        assert_eq!(msg.segments(), &[Segment::text(EMPTY_CONTENT_PLACEHOLDER)]);
    }

    #[test]
    fn empty_array_becomes_placeholder() {
        let msg = normalize_content(json!([]));
        assert_eq!(msg.segments(), &[Segment::text(EMPTY_CONTENT_PLACEHOLDER)]);
    }

    #[test]
    fn segment_array_with_type_and_data_parses() {
        let msg = normalize_content(json!([
            {"type": "text", "data": {"text": "hi"}},
            {"type": "at", "data": {"qq": "123"}},
        ]));
        assert_eq!(
            msg.segments(),
            &[Segment::text("hi"), Segment::At { qq: "123".to_string() }]
        );
    }

    #[test]
    fn single_segment_object_normalizes() {
        let msg = normalize_content(json!({"type": "at", "data": {"qq": "55"}}));
        assert_eq!(msg.segments(), &[Segment::At { qq: "55".to_string() }]);
    }

    #[test]
    fn sendable_copies_url_into_file_when_missing() {
        let msg = Message::new(vec![Segment::Image {
            attrs: std::collections::BTreeMap::from([(
                "url".to_string(),
                json!("http://example/x.jpg"),
            )]),
        }]);
        let sendable = normalize_sendable(msg);
        match &sendable.segments()[0] {
            Segment::Image { attrs } => {
                assert_eq!(attrs.get("file"), Some(&json!("http://example/x.jpg")));
            }
            _ => panic!("expected image segment"),
        }
    }

    #[test]
    fn sendable_leaves_existing_file_untouched() {
        let msg = Message::new(vec![Segment::Image {
            attrs: std::collections::BTreeMap::from([
                ("file".to_string(), json!("local.jpg")),
                ("url".to_string(), json!("http://example/x.jpg")),
            ]),
        }]);
        let sendable = normalize_sendable(msg);
        match &sendable.segments()[0] {
            Segment::Image { attrs } => {
                assert_eq!(attrs.get("file"), Some(&json!("local.jpg")));
            }
            _ => panic!("expected image segment"),
        }
    }
}
