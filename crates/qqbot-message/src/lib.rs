pub mod cq;
pub mod forward;
pub mod normalize;
pub mod reply;
pub mod segment;

pub use cq::{parse_cq_string, to_cq_string};
pub use forward::extract_forward_ids;
pub use normalize::{normalize_content, normalize_sendable};
pub use reply::{summarize_quoted, summarize_reply, QuotedContent, ReplyResolver};
pub use segment::{string_attr, Message, Segment, SegmentRecord};
