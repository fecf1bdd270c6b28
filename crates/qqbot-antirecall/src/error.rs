use thiserror::Error;

/// Reserved for the ingest pipeline's `Result` signature — every step that
/// can fail degrades in place instead of raising, so this enum currently
/// has no path that actually constructs it. Kept so `handle_group_message`
/// can return a `Result` without a later fallible step forcing a signature
/// change.
#[derive(Debug, Error)]
pub enum AntiRecallError {
    #[error(transparent)]
    Adapter(#[from] qqbot_adapter::AdapterError),
}

pub type Result<T> = std::result::Result<T, AntiRecallError>;
