pub mod config;
pub mod generate;
pub mod interactive;
pub mod options;
pub mod refine;
pub mod serve;

use anyhow::Context;
use clap::Args;
use pipegen_core::types::{BuildTool, CiTool, DeploymentTarget, Language};
use pipegen_core::{CompletionBackend, Config, Credential, GenerationRequest};
use std::sync::Arc;

/// The four selections that define a pipeline.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// CI tool: azure-devops, jenkins, github-actions, gitlab-ci
    #[arg(long)]
    pub ci_tool: CiTool,

    /// Language: java, dotnet, nodejs, python
    #[arg(long)]
    pub language: Language,

    /// Build tool: maven, gradle, msbuild, npm, yarn, pip
    #[arg(long)]
    pub build_tool: BuildTool,

    /// Deployment target: aks, openshift
    #[arg(long = "target")]
    pub deployment_target: DeploymentTarget,
}

impl From<SelectionArgs> for GenerationRequest {
    fn from(a: SelectionArgs) -> Self {
        GenerationRequest {
            ci_tool: a.ci_tool,
            language: a.language,
            build_tool: a.build_tool,
            deployment_target: a.deployment_target,
        }
    }
}

/// Read the API credential and build the configured backend.
///
/// A missing credential is fatal: nothing is generated or served without it.
pub fn connect(config: &Config) -> anyhow::Result<Arc<dyn CompletionBackend>> {
    let credential = Credential::from_env()?;
    let backend = config
        .build_backend(&credential)
        .context("failed to initialise generation backend")?;
    tracing::debug!(model = backend.model(), "backend ready");
    Ok(Arc::new(backend))
}
