use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use llm_client::{ChatClient, ClientConfig, RetryPolicy};

use crate::backend::{BackendError, OpenAiBackend};
use crate::error::{PipegenError, Result};
use crate::prompt::PromptTemplates;

/// Conventional config filename looked up in the working directory.
pub const CONFIG_FILE: &str = "pipegen.yaml";

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "PIPEGEN_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    llm_client::client::DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_url() -> String {
    llm_client::client::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions untouched for this long are dropped.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
}

fn default_port() -> u16 {
    3141
}

fn default_session_ttl() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            session_ttl_minutes: default_session_ttl(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub prompts: PromptTemplates,
}

impl Config {
    /// Load configuration.
    ///
    /// Priority:
    /// 1. `explicit` path (`--config` / `PIPEGEN_CONFIG`); must exist
    /// 2. `pipegen.yaml` in `cwd`, if present
    /// 3. built-in defaults
    ///
    /// Environment overrides are applied on top in every case.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut cfg = match Self::locate(explicit, cwd)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env(|var| std::env::var(var).ok());
        Ok(cfg)
    }

    fn locate(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
        if let Some(p) = explicit {
            if !p.exists() {
                return Err(PipegenError::ConfigNotFound(p.display().to_string()));
            }
            return Ok(Some(p.to_path_buf()));
        }
        let conventional = cwd.join(CONFIG_FILE);
        Ok(conventional.exists().then_some(conventional))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Apply `PIPEGEN_MODEL` and `OPENAI_BASE_URL` overrides. Blank values
    /// are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |var: &str| lookup(var).filter(|v: &String| !v.trim().is_empty());
        if let Some(model) = non_blank(MODEL_VAR) {
            self.backend.model = model;
        }
        if let Some(url) = non_blank(BASE_URL_VAR) {
            self.backend.base_url = url;
        }
    }

    pub fn client_config(&self, credential: &Credential) -> ClientConfig {
        ClientConfig {
            api_key: credential.expose().to_string(),
            base_url: self.backend.base_url.clone(),
            model: self.backend.model.clone(),
            temperature: self.backend.temperature,
            timeout: Duration::from_secs(self.backend.timeout_secs),
            retry: RetryPolicy {
                max_retries: self.backend.max_retries,
                ..RetryPolicy::default()
            },
        }
    }

    pub fn build_backend(&self, credential: &Credential) -> Result<OpenAiBackend> {
        let client = ChatClient::new(self.client_config(credential)).map_err(BackendError::from)?;
        Ok(OpenAiBackend::new(client))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "backend.temperature={} is outside the accepted range 0..=2",
                    self.backend.temperature
                ),
            });
        }

        if self.backend.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "backend.timeout_secs is 0; every request would time out".to_string(),
            });
        }

        if self.backend.max_retries > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "backend.max_retries={} (>10 is unusual)",
                    self.backend.max_retries
                ),
            });
        }

        if self.prompts.instructions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "prompts.instructions is empty; every tool uses the generic instruction"
                    .to_string(),
            });
        }

        if self.server.session_ttl_minutes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.session_ttl_minutes is 0; sessions expire immediately"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// API key for the generation backend. `Debug` never prints the secret.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Credential(key.into())
    }

    /// Read `OPENAI_API_KEY` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Credential)
            .ok_or_else(|| PipegenError::MissingCredential(API_KEY_VAR.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
