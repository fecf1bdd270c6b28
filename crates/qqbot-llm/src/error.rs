use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("{provider} is missing required configuration: {field}")]
    MissingConfig { provider: &'static str, field: &'static str },

    #[error("transport error calling {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Api { provider: &'static str, status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, LlmError>;
