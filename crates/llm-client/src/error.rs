use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode completion response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("completion response contained no choices")]
    NoChoices,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl LlmError {
    /// Whether a later attempt at the same request could succeed.
    ///
    /// 429 and 5xx are transient, as is a failed connection. Any other
    /// 4xx means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http { status, .. } => *status == 429 || *status >= 500,
            LlmError::Transport(_) => true,
            LlmError::Decode(_) | LlmError::NoChoices | LlmError::Client(_) => false,
        }
    }
}
