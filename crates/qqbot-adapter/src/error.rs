use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport error calling {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("action {action} failed: retcode {retcode} ({message})")]
    Action { action: String, retcode: i64, message: String },

    #[error("could not parse response for {action}: {source}")]
    Parse {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("adapter '{0}' is not supported")]
    UnsupportedAdapter(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
