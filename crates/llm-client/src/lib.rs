//! `llm-client`: blocking driver for OpenAI-compatible chat-completions APIs.
//!
//! One prompt in, one completion out. The client owns its retry policy so
//! callers see either the final text or a single terminal error.
//!
//! # Architecture
//!
//! ```text
//! ClientConfig
//!     │
//!     ▼
//! ChatClient      ← POST {base_url}/chat/completions, bearer auth
//!     │              retries transport errors, 429 and 5xx
//!     ▼
//! ChatResponse    ← typed choices/usage; first choice is the answer
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use llm_client::{ChatClient, ClientConfig};
//!
//! let client = ChatClient::new(ClientConfig::new(api_key))?;
//! let reply = client.complete("Write a hello-world GitHub Actions workflow.")?;
//! println!("{}", reply.content);
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{ChatClient, ClientConfig, Reply, RetryPolicy};
pub use error::LlmError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, ResponseMessage, Role, Usage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, LlmError>;
