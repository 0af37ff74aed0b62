// Gridmind Core Library
// OpenRouter chat-completions client and cell-map normalization

pub mod cellmap;
pub mod llm;

// Export core types
pub use cellmap::{normalize, CellMap};
pub use llm::{LlmClient, LlmClientConfig, DEFAULT_MODEL};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridmindError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("OpenRouter authentication failed: invalid or missing API key")]
    AuthFailed,

    #[error("network error contacting OpenRouter: {0}")]
    Network(#[source] reqwest::Error),

    #[error("OpenRouter request failed with status {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("OpenRouter response did not contain message content")]
    MalformedResponse,

    #[error("model returned an empty response")]
    EmptyCompletion,

    #[error("model response is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("model response is not a valid cell map (not a JSON object)")]
    NotACellMap,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridmindError>;
