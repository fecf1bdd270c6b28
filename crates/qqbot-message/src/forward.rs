//! Forward id extraction (§4.4): gateway implementations disagree on which
//! attribute key carries a forward card's opaque resource id, so every
//! candidate key is checked.

use crate::segment::{string_attr, Segment};

const CANDIDATE_KEYS: [&str; 4] = ["id", "forward_id", "res_id", "file"];

/// Collect ids from every `forward`-kind segment, checking `id` /
/// `forward_id` / `res_id` / `file` in that order and taking the first
/// attribute present.
pub fn extract_forward_ids(segments: &[Segment]) -> Vec<String> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Forward { attrs } => {
                CANDIDATE_KEYS.iter().find_map(|key| string_attr(attrs, key))
            }
            _ => None,
        })
        .collect()
}
