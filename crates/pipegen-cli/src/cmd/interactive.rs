use pipegen_core::{
    CompletionBackend, Config, GenerationRequest, PipegenError, PromptSession, RefinementRequest,
};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

const HELP: &str = "Type feedback to refine the pipeline. Commands: /show, /save, /help, /quit";

pub fn run(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
    request: GenerationRequest,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let mut session = PromptSession::new(backend, Arc::new(config.prompts.clone()));
    let artifact = session.generate(&request)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} pipeline generated.\n", request.ci_tool.label())?;
    writeln!(out, "{}\n", artifact.content)?;
    writeln!(out, "{HELP}")?;

    let stdin = std::io::stdin();
    drive(&mut session, stdin.lock(), &mut out, out_dir)
}

/// Read feedback lines until `/quit` or end of input, refining after each.
///
/// Rejected feedback and backend failures are reported and the loop keeps
/// going; the session is untouched by a failed refinement.
pub fn drive(
    session: &mut PromptSession,
    input: impl BufRead,
    out: &mut impl Write,
    out_dir: &Path,
) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "/quit" | "/exit" => break,
            "/help" => writeln!(out, "{HELP}")?,
            "/show" => match session.artifact() {
                Some(a) => writeln!(out, "{}", a.content)?,
                None => writeln!(out, "warning: {}", PipegenError::NoArtifact)?,
            },
            "/save" => match session.artifact() {
                Some(a) => {
                    let path = a.write_to(out_dir)?;
                    writeln!(out, "Saved {}", path.display())?;
                }
                None => writeln!(out, "warning: {}", PipegenError::NoArtifact)?,
            },
            _ => {
                let Some(ci_tool) = session.artifact().map(|a| a.ci_tool) else {
                    writeln!(out, "warning: {}", PipegenError::NoArtifact)?;
                    continue;
                };
                let request = RefinementRequest {
                    feedback: line.clone(),
                    ci_tool,
                };
                match session.refine(&request) {
                    Ok(artifact) => {
                        writeln!(
                            out,
                            "Pipeline refined (iteration {}).\n\n{}\n",
                            session.iteration_count(),
                            artifact.content
                        )?;
                    }
                    Err(e @ (PipegenError::EmptyFeedback | PipegenError::NoArtifact)) => {
                        writeln!(out, "warning: {e}")?;
                    }
                    Err(e @ (PipegenError::Backend(_) | PipegenError::EmptyResponse)) => {
                        writeln!(out, "error: {e} (pipeline unchanged, try again)")?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(())
}
