//! CQ-string codec — the URL-parameter-like bracketed encoding OneBot V11
//! uses for some send APIs (notably custom forward node content, which
//! must be a string rather than a segment array).
//!
//! Example: `[CQ:image,file=abc.jpg]hello[CQ:at,qq=123]`

use std::collections::BTreeMap;

use serde_json::Value;

use crate::segment::{Message, Segment};

/// Parse a CQ-encoded string into a [`Message`].
pub fn parse_cq_string(input: &str) -> Message {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("[CQ:") {
        if start > 0 {
            let text = unescape_text(&rest[..start]);
            if !text.is_empty() {
                segments.push(Segment::text(text));
            }
        }
        let after_start = &rest[start + 4..];
        match after_start.find(']') {
            Some(end) => {
                let body = &after_start[..end];
                segments.push(parse_cq_tag(body));
                rest = &after_start[end + 1..];
            }
            None => {
                // Unterminated tag — treat the rest as literal text rather
                // than dropping it silently.
                let text = unescape_text(&rest[start..]);
                if !text.is_empty() {
                    segments.push(Segment::text(text));
                }
                rest = "";
                break;
            }
        }
    }

    if !rest.is_empty() {
        let text = unescape_text(rest);
        if !text.is_empty() {
            segments.push(Segment::text(text));
        }
    }

    Message::new(segments)
}

fn parse_cq_tag(body: &str) -> Segment {
    let mut parts = body.splitn(2, ',');
    let kind = parts.next().unwrap_or_default().to_string();
    let mut attrs: BTreeMap<String, Value> = BTreeMap::new();

    if let Some(params) = parts.next() {
        for pair in params.split(',') {
            if let Some((key, value)) = pair.split_once('=') {
                attrs.insert(key.to_string(), Value::String(unescape_param(value)));
            }
        }
    }

    Segment::from_record(crate::segment::SegmentRecord { kind, attributes: attrs })
}

/// Re-emit the CQ encoding for a segment list (§4.4 `to_cq_string`).
pub fn to_cq_string(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { text } => out.push_str(&escape_text(text)),
            other => {
                out.push_str("[CQ:");
                out.push_str(other.kind());
                for (key, value) in other.as_attrs() {
                    if key == "text" {
                        continue;
                    }
                    let rendered = match &value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.push(',');
                    out.push_str(&key);
                    out.push('=');
                    out.push_str(&escape_param(&rendered));
                }
                out.push(']');
            }
        }
    }
    out
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('[', "&#91;").replace(']', "&#93;")
}

fn unescape_text(s: &str) -> String {
    s.replace("&#93;", "]").replace("&#91;", "[").replace("&amp;", "&")
}

fn escape_param(s: &str) -> String {
    escape_text(s).replace(',', "&#44;")
}

fn unescape_param(s: &str) -> String {
    let s = s.replace("&#44;", ",");
    unescape_text(&s)
}
