use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::types::{ChatMessage, ChatRequest, ChatResponse, Usage};
use crate::{LlmError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

// ─── RetryPolicy ──────────────────────────────────────────────────────────

/// Bounded exponential backoff applied to retryable failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one. `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// ─── ClientConfig ─────────────────────────────────────────────────────────

/// Everything needed to talk to one chat-completions endpoint.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ClientConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

// ─── Reply ────────────────────────────────────────────────────────────────

/// The answer to a single prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Text of the first choice, exactly as returned.
    pub content: String,
    /// Model the server reports having used, if any.
    pub model: Option<String>,
    pub usage: Option<Usage>,
    /// Total HTTP attempts made, including the successful one.
    pub attempts: u32,
}

// ─── ChatClient ───────────────────────────────────────────────────────────

pub struct ChatClient {
    http: Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Client)?;
        Ok(ChatClient { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `prompt` as a single user message and return the first choice.
    ///
    /// Retryable failures (see [`LlmError::is_retryable`]) are retried up to
    /// `retry.max_retries` times; the last error is returned when the budget
    /// runs out.
    pub fn complete(&self, prompt: &str) -> Result<Reply> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.config.temperature,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send(&request) {
                Ok(response) => return into_reply(response, attempt),
                Err(e) if e.is_retryable() && attempt <= self.config.retry.max_retries => {
                    let delay = self.config.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.retry.max_retries,
                        ?delay,
                        "completion request failed, retrying: {e}"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        tracing::debug!(model = %request.model, prompt_len = request.messages[0].content.len(), "POST {url}");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .map_err(LlmError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<ChatResponse>().map_err(LlmError::Decode)
    }
}

fn into_reply(response: ChatResponse, attempts: u32) -> Result<Reply> {
    let content = response.first_content().ok_or(LlmError::NoChoices)?.to_string();
    Ok(Reply {
        content,
        model: response.model,
        usage: response.usage,
        attempts,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &mockito::Server, max_retries: u32) -> ClientConfig {
        ClientConfig {
            base_url: server.url(),
            retry: RetryPolicy {
                max_retries,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            },
            ..ClientConfig::new("sk-test")
        }
    }

    fn success_body(text: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        })
        .to_string()
    }

    #[test]
    fn complete_returns_first_choice() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(success_body("name: ci"))
            .create();

        let client = ChatClient::new(config_for(&server, 0)).unwrap();
        let reply = client.complete("hello").unwrap();

        mock.assert();
        assert_eq!(reply.content, "name: ci");
        assert_eq!(reply.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert_eq!(reply.usage.unwrap().total_tokens, 17);
        assert_eq!(reply.attempts, 1);
    }

    #[test]
    fn retries_server_errors_until_success() {
        let mut server = mockito::Server::new();
        // Matching mocks are served in creation order until each one has
        // received its expected hits.
        let failing = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create();
        let ok = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(success_body("done"))
            .expect(1)
            .create();

        let client = ChatClient::new(config_for(&server, 3)).unwrap();
        let reply = client.complete("hi").unwrap();

        failing.assert();
        ok.assert();
        assert_eq!(reply.content, "done");
        assert_eq!(reply.attempts, 3);
    }

    #[test]
    fn gives_up_after_retry_budget() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .expect(3)
            .create();

        let client = ChatClient::new(config_for(&server, 2)).unwrap();
        let err = client.complete("hi").unwrap_err();

        mock.assert();
        match err {
            LlmError::Http { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .expect(1)
            .create();

        let client = ChatClient::new(config_for(&server, 3)).unwrap();
        let err = client.complete("hi").unwrap_err();

        mock.assert();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create();

        let client = ChatClient::new(config_for(&server, 0)).unwrap();
        let err = client.complete("hi").unwrap_err();
        assert!(matches!(err, LlmError::NoChoices));
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(success_body("ok"))
            .create();

        let mut config = config_for(&server, 0);
        config.base_url.push('/');
        let client = ChatClient::new(config).unwrap();
        client.complete("hi").unwrap();
        mock.assert();
    }

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", ClientConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
