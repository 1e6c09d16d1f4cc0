use crate::output::print_json;
use pipegen_core::{CompletionBackend, Config, GenerationRequest, PipelineArtifact, PromptSession};
use std::path::Path;
use std::sync::Arc;

pub fn run(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
    request: GenerationRequest,
    out: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = PromptSession::new(backend, Arc::new(config.prompts.clone()));
    let artifact = session.generate(&request)?;
    emit(&artifact, session.iteration_count(), out, json)
}

/// Print an artifact and optionally save it. Shared by `generate` and `refine`.
pub fn emit(
    artifact: &PipelineArtifact,
    iteration_count: u32,
    out: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let written = out.map(|dir| artifact.write_to(dir)).transpose()?;

    if json {
        return print_json(&serde_json::json!({
            "artifact": artifact,
            "iteration_count": iteration_count,
            "filename": artifact.download_filename(),
            "written_to": written,
        }));
    }

    println!("{}", artifact.content);
    if let Some(path) = written {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
