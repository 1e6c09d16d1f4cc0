use crate::cmd::generate::emit;
use anyhow::{bail, Context};
use pipegen_core::types::CiTool;
use pipegen_core::{
    CompletionBackend, Config, PipelineArtifact, PromptSession, RefinementRequest, SessionState,
};
use std::path::PathBuf;
use std::sync::Arc;

pub struct RefineArgs {
    pub ci_tool: CiTool,
    pub input: PathBuf,
    pub feedback: String,
    pub out: Option<PathBuf>,
}

pub fn run(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
    args: RefineArgs,
    json: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let content = content.trim();
    if content.is_empty() {
        bail!("{} is empty: nothing to refine", args.input.display());
    }
    let state = SessionState::with_artifact(PipelineArtifact::new(args.ci_tool, content));

    let mut session = PromptSession::with_state(backend, Arc::new(config.prompts.clone()), state);
    let artifact = session.refine(&RefinementRequest {
        feedback: args.feedback,
        ci_tool: args.ci_tool,
    })?;
    emit(&artifact, session.iteration_count(), args.out.as_deref(), json)
}
