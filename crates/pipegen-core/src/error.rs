use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum PipegenError {
    #[error("missing API credential: set {0} in the environment")]
    MissingCredential(String),

    #[error("generation backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("generation backend returned an empty response")]
    EmptyResponse,

    #[error("no pipeline generated yet: generate one before refining")]
    NoArtifact,

    #[error("feedback is empty: describe what to change before refining")]
    EmptyFeedback,

    #[error("invalid CI tool '{0}': expected one of azure-devops, jenkins, github-actions, gitlab-ci")]
    InvalidCiTool(String),

    #[error("invalid language '{0}': expected one of java, dotnet, nodejs, python")]
    InvalidLanguage(String),

    #[error("invalid build tool '{0}': expected one of maven, gradle, msbuild, npm, yarn, pip")]
    InvalidBuildTool(String),

    #[error("invalid deployment target '{0}': expected one of aks, openshift")]
    InvalidDeploymentTarget(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipegenError>;
