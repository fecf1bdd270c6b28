//! §4.7/§4.8 turn structuring: a platform message becomes a multimodal
//! [`ChatMessage`] instead of collapsing to plain text. Grounded on the
//! original `extract_turn` (plugin/agent/message_extract.py), which
//! matches each segment's kind and drops anything it doesn't recognize
//! (files included) rather than failing the whole turn.

use qqbot_adapter::PlatformAdapter;
use qqbot_llm::{ChatMessage, Content, Role};
use qqbot_message::{string_attr, Segment};
use tracing::warn;

/// Structure a message's segments into one [`ChatMessage`] for `role`.
/// Voice segments require fetching the actual audio, so this is async;
/// a segment whose audio can't be fetched is logged and dropped rather
/// than failing the whole turn.
pub async fn extract_turn(role: Role, segments: &[Segment], adapter: &dyn PlatformAdapter) -> ChatMessage {
    let mut content = Vec::with_capacity(segments.len());

    for segment in segments {
        match segment {
            Segment::Text { text } => content.push(Content::Text { text: text.clone() }),
            Segment::Image { attrs } => {
                let Some(url) = string_attr(attrs, "url") else { continue };
                let filename = string_attr(attrs, "file").or_else(|| string_attr(attrs, "id")).unwrap_or_default();
                content.push(Content::Image { url, filename });
            }
            Segment::Voice { attrs } => {
                let Some(file) = string_attr(attrs, "file") else { continue };
                match adapter.extract_audio_base64(&file).await {
                    Ok(base64_mp3) => content.push(Content::Audio { base64_mp3 }),
                    Err(e) => warn!(error = %e, file, "failed to extract voice segment audio, dropping turn part"),
                }
            }
            // Reply/Forward/At/Video/File/Unknown segments have no content
            // representation the LLM can consume and are silently dropped,
            // matching the original's unmatched-case behavior.
            _ => {}
        }
    }

    ChatMessage { role, content }
}
