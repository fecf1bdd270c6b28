use thiserror::Error;

/// Shared error type for deployment-config loading.
///
/// Individual components (C1 config store, C3 adapter, C6 engine, …) each
/// define their own narrower error enum; this one only covers the ambient
/// concerns living in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
