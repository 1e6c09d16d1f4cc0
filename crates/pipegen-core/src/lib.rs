pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod io;
pub mod prompt;
pub mod session;
pub mod types;

pub use artifact::PipelineArtifact;
pub use backend::{BackendError, Completion, CompletionBackend, OpenAiBackend};
pub use config::{Config, Credential};
pub use error::{PipegenError, Result};
pub use session::{GenerationRequest, PromptSession, RefinementRequest, SessionState};
