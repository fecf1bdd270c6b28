use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The universal interchange form for a single OneBot segment — a tagged
/// record `{kind, attributes}` per §3 of the spec.
///
/// This is the wire-level shape (what `to_segments`/`normalize_content`
/// produce and consume). [`Segment`] is the typed, Rust-native shape the
/// rest of this crate and its callers pattern-match on; the two convert
/// losslessly via [`Segment::to_record`]/[`Segment::from_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, rename = "data")]
    pub attributes: BTreeMap<String, Value>,
}

/// Typed segment variants, per the design note in DESIGN.md: known kinds
/// get a dedicated variant so the engine can match on them directly;
/// anything else round-trips through [`Segment::Unknown`] untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text { text: String },
    Image { attrs: BTreeMap<String, Value> },
    Voice { attrs: BTreeMap<String, Value> },
    Reply { id: String },
    Forward { attrs: BTreeMap<String, Value> },
    At { qq: String },
    Video { attrs: BTreeMap<String, Value> },
    File { attrs: BTreeMap<String, Value> },
    /// A kind this crate doesn't interpret — preserved verbatim so it
    /// survives a decode/encode round trip unchanged.
    Unknown { kind: String, attrs: BTreeMap<String, Value> },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn kind(&self) -> &str {
        match self {
            Segment::Text { .. } => "text",
            Segment::Image { .. } => "image",
            Segment::Voice { .. } => "voice",
            Segment::Reply { .. } => "reply",
            Segment::Forward { .. } => "forward",
            Segment::At { .. } => "at",
            Segment::Video { .. } => "video",
            Segment::File { .. } => "file",
            Segment::Unknown { kind, .. } => kind,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Segment::Image { .. })
    }

    pub fn as_attrs(&self) -> BTreeMap<String, Value> {
        match self {
            Segment::Text { text } => {
                BTreeMap::from([("text".to_string(), Value::String(text.clone()))])
            }
            Segment::Image { attrs }
            | Segment::Voice { attrs }
            | Segment::Forward { attrs }
            | Segment::Video { attrs }
            | Segment::File { attrs }
            | Segment::Unknown { attrs, .. } => attrs.clone(),
            Segment::Reply { id } => {
                BTreeMap::from([("id".to_string(), Value::String(id.clone()))])
            }
            Segment::At { qq } => BTreeMap::from([("qq".to_string(), Value::String(qq.clone()))]),
        }
    }

    /// Produce the wire-level `{kind, attributes}` record for this segment.
    pub fn to_record(&self) -> SegmentRecord {
        SegmentRecord {
            kind: self.kind().to_string(),
            attributes: self.as_attrs(),
        }
    }

    /// Build a typed segment from a wire-level record.
    pub fn from_record(record: SegmentRecord) -> Self {
        let SegmentRecord { kind, attributes } = record;
        match kind.as_str() {
            "text" => Segment::Text {
                text: string_attr(&attributes, "text").unwrap_or_default(),
            },
            "image" => Segment::Image { attrs: attributes },
            "voice" | "record" => Segment::Voice { attrs: attributes },
            "reply" => Segment::Reply {
                id: string_attr(&attributes, "id").unwrap_or_default(),
            },
            "forward" => Segment::Forward { attrs: attributes },
            "at" => Segment::At {
                qq: string_attr(&attributes, "qq").unwrap_or_default(),
            },
            "video" => Segment::Video { attrs: attributes },
            "file" => Segment::File { attrs: attributes },
            other => Segment::Unknown {
                kind: other.to_string(),
                attrs: attributes,
            },
        }
    }
}

/// Read a string-shaped attribute, accepting either a JSON string or a
/// scalar coerced to its string form (gateways disagree on numeric vs.
/// string ids for the same key).
pub fn string_attr(attrs: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match attrs.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An ordered sequence of segments — the in-memory form of a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message(pub Vec<Segment>);

impl Message {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.0
    }

    /// `to_segments(message)` from §4.4: emit the wire-level record array.
    pub fn to_segments(&self) -> Vec<SegmentRecord> {
        self.0.iter().map(Segment::to_record).collect()
    }

    pub fn from_records(records: Vec<SegmentRecord>) -> Self {
        Self(records.into_iter().map(Segment::from_record).collect())
    }

    /// Concatenate every text segment's content, in order.
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|s| match s {
                Segment::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}
