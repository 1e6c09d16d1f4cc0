use llm_client::{ChatClient, LlmError};
use thiserror::Error;

/// Successful answer from a generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    /// Model that produced the text, when the provider reports it.
    pub model: Option<String>,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Completion {
            content: content.into(),
            model: None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not reach provider: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// A text-completion service: one prompt in, free text out.
///
/// Implementations own any retry behaviour; callers treat an `Err` as final.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<Completion, BackendError>;
}

impl From<LlmError> for BackendError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http { status, body } => BackendError::Api {
                status,
                message: body,
            },
            LlmError::Transport(e) | LlmError::Client(e) => BackendError::Transport(e.to_string()),
            LlmError::Decode(e) => BackendError::Malformed(e.to_string()),
            LlmError::NoChoices => BackendError::Malformed(LlmError::NoChoices.to_string()),
        }
    }
}

/// [`CompletionBackend`] over an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiBackend {
    client: ChatClient,
}

impl OpenAiBackend {
    pub fn new(client: ChatClient) -> Self {
        OpenAiBackend { client }
    }

    pub fn model(&self) -> &str {
        &self.client.config().model
    }
}

impl CompletionBackend for OpenAiBackend {
    fn complete(&self, prompt: &str) -> Result<Completion, BackendError> {
        let reply = self.client.complete(prompt)?;
        if let Some(usage) = reply.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                attempts = reply.attempts,
                "completion received"
            );
        }
        Ok(Completion {
            content: reply.content,
            model: reply.model,
        })
    }
}
