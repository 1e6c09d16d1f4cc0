use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::artifact::PipelineArtifact;
use crate::backend::{Completion, CompletionBackend};
use crate::error::{PipegenError, Result};
use crate::prompt::PromptTemplates;
use crate::types::{BuildTool, CiTool, DeploymentTarget, Language};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub ci_tool: CiTool,
    pub language: Language,
    pub build_tool: BuildTool,
    pub deployment_target: DeploymentTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub feedback: String,
    /// Tool named in the refine prompt. Usually the artifact's own tool.
    pub ci_tool: CiTool,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current artifact and how many refinements it has been through.
///
/// `iteration_count` is 0 right after a generate and grows by one per
/// successful refine. It carries no meaning while `artifact` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    artifact: Option<PipelineArtifact>,
    iteration_count: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session from an artifact produced elsewhere (e.g. a saved file).
    pub fn with_artifact(artifact: PipelineArtifact) -> Self {
        SessionState {
            artifact: Some(artifact),
            iteration_count: 0,
        }
    }

    pub fn artifact(&self) -> Option<&PipelineArtifact> {
        self.artifact.as_ref()
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }
}

// ---------------------------------------------------------------------------
// PromptSession
// ---------------------------------------------------------------------------

/// Turns selections and feedback into prompts and applies backend answers to
/// a [`SessionState`].
///
/// Every operation either fully applies or leaves the state exactly as it
/// was: the backend is called first and the state is only touched once a
/// usable answer is in hand.
pub struct PromptSession {
    backend: Arc<dyn CompletionBackend>,
    templates: Arc<PromptTemplates>,
    state: SessionState,
}

impl PromptSession {
    pub fn new(backend: Arc<dyn CompletionBackend>, templates: Arc<PromptTemplates>) -> Self {
        Self::with_state(backend, templates, SessionState::new())
    }

    pub fn with_state(
        backend: Arc<dyn CompletionBackend>,
        templates: Arc<PromptTemplates>,
        state: SessionState,
    ) -> Self {
        PromptSession {
            backend,
            templates,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn artifact(&self) -> Option<&PipelineArtifact> {
        self.state.artifact()
    }

    pub fn iteration_count(&self) -> u32 {
        self.state.iteration_count()
    }

    /// Forget the current artifact.
    pub fn reset(&mut self) {
        self.state = SessionState::new();
    }

    /// Generate a fresh pipeline, replacing any current artifact and
    /// resetting the iteration count.
    pub fn generate(&mut self, request: &GenerationRequest) -> Result<PipelineArtifact> {
        let prompt = self.templates.generate_prompt(
            request.ci_tool,
            request.language,
            request.build_tool,
            request.deployment_target,
        );
        tracing::debug!(ci_tool = %request.ci_tool, prompt_len = prompt.len(), "generating pipeline");

        let content = accept(self.backend.complete(&prompt)?)?;
        let artifact = PipelineArtifact::new(request.ci_tool, content);

        self.state = SessionState::with_artifact(artifact.clone());
        tracing::info!(
            ci_tool = %request.ci_tool,
            language = %request.language,
            build_tool = %request.build_tool,
            target = %request.deployment_target,
            "pipeline generated"
        );
        Ok(artifact)
    }

    /// Revise the current artifact per `request.feedback`.
    ///
    /// Fails with [`PipegenError::NoArtifact`] or [`PipegenError::EmptyFeedback`]
    /// without contacting the backend.
    pub fn refine(&mut self, request: &RefinementRequest) -> Result<PipelineArtifact> {
        let Some(current) = self.state.artifact.as_ref() else {
            tracing::warn!("refine rejected: no artifact");
            return Err(PipegenError::NoArtifact);
        };
        let feedback = request.feedback.trim();
        if feedback.is_empty() {
            tracing::warn!("refine rejected: empty feedback");
            return Err(PipegenError::EmptyFeedback);
        }

        let prompt = self
            .templates
            .refine_prompt(request.ci_tool, feedback, &current.content);
        tracing::debug!(ci_tool = %request.ci_tool, prompt_len = prompt.len(), "refining pipeline");

        let content = accept(self.backend.complete(&prompt)?)?;

        let artifact = self
            .state
            .artifact
            .as_mut()
            .ok_or(PipegenError::NoArtifact)?;
        artifact.content = content;
        let refined = artifact.clone();
        self.state.iteration_count += 1;
        tracing::info!(
            ci_tool = %request.ci_tool,
            iteration = self.state.iteration_count,
            "pipeline refined"
        );
        Ok(refined)
    }
}

/// Trim surrounding whitespace; an answer with nothing left is an error
/// rather than an artifact.
fn accept(completion: Completion) -> Result<String> {
    let content = completion.content.trim();
    if content.is_empty() {
        return Err(PipegenError::EmptyResponse);
    }
    Ok(content.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::types::PipelineFormat;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answers in order and records every prompt it sees.
    struct ScriptedBackend {
        answers: Mutex<VecDeque<std::result::Result<Completion, BackendError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(answers: Vec<std::result::Result<Completion, BackendError>>) -> Arc<Self> {
            Arc::new(ScriptedBackend {
                answers: Mutex::new(answers.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    impl CompletionBackend for ScriptedBackend {
        fn complete(&self, prompt: &str) -> std::result::Result<Completion, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Transport("script exhausted".into())))
        }
    }

    fn ok(text: &str) -> std::result::Result<Completion, BackendError> {
        Ok(Completion::new(text))
    }

    fn outage() -> std::result::Result<Completion, BackendError> {
        Err(BackendError::Api {
            status: 503,
            message: "unavailable".into(),
        })
    }

    fn session(backend: &Arc<ScriptedBackend>) -> PromptSession {
        PromptSession::new(backend.clone(), Arc::new(PromptTemplates::default()))
    }

    fn gha_python() -> GenerationRequest {
        GenerationRequest {
            ci_tool: CiTool::GitHubActions,
            language: Language::Python,
            build_tool: BuildTool::Pip,
            deployment_target: DeploymentTarget::Aks,
        }
    }

    fn refine_req(feedback: &str) -> RefinementRequest {
        RefinementRequest {
            feedback: feedback.into(),
            ci_tool: CiTool::GitHubActions,
        }
    }

    #[test]
    fn generate_then_refine_scenario() {
        let backend = ScriptedBackend::new(vec![
            ok("name: ci\njobs: ..."),
            ok("name: ci\njobs: ...\ncache: true"),
        ]);
        let mut s = session(&backend);

        let generated = s.generate(&gha_python()).unwrap();
        assert_eq!(generated.content, "name: ci\njobs: ...");
        assert_eq!(generated.format, PipelineFormat::Yaml);
        assert_eq!(generated.file_extension, ".yml");
        assert_eq!(s.iteration_count(), 0);

        let refined = s.refine(&refine_req("add caching")).unwrap();
        assert_eq!(refined.content, "name: ci\njobs: ...\ncache: true");
        assert_eq!(refined.format, PipelineFormat::Yaml);
        assert_eq!(refined.file_extension, ".yml");
        assert_eq!(s.iteration_count(), 1);
        assert_eq!(s.artifact(), Some(&refined));

        let prompt = backend.last_prompt();
        assert!(prompt.contains("Feedback: add caching"));
        assert!(prompt.contains("name: ci\njobs: ..."));
    }

    #[test]
    fn every_tool_gets_its_format() {
        for &tool in CiTool::all() {
            let backend = ScriptedBackend::new(vec![ok("pipeline")]);
            let mut s = session(&backend);
            let artifact = s
                .generate(&GenerationRequest {
                    ci_tool: tool,
                    ..gha_python()
                })
                .unwrap();
            let expected = if tool == CiTool::Jenkins {
                (PipelineFormat::Groovy, "Jenkinsfile")
            } else {
                (PipelineFormat::Yaml, ".yml")
            };
            assert_eq!((artifact.format, artifact.file_extension.as_str()), expected);
        }
    }

    #[test]
    fn generate_resets_iteration_count() {
        let backend = ScriptedBackend::new(vec![ok("v0"), ok("v1"), ok("v2"), ok("fresh")]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        s.refine(&refine_req("one")).unwrap();
        s.refine(&refine_req("two")).unwrap();
        assert_eq!(s.iteration_count(), 2);

        s.generate(&gha_python()).unwrap();
        assert_eq!(s.iteration_count(), 0);
        assert_eq!(s.artifact().unwrap().content, "fresh");
    }

    #[test]
    fn refine_without_artifact_is_rejected() {
        let backend = ScriptedBackend::new(vec![ok("unused")]);
        let mut s = session(&backend);

        let err = s.refine(&refine_req("add caching")).unwrap_err();
        assert!(matches!(err, PipegenError::NoArtifact));
        assert_eq!(s.state(), &SessionState::new());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn whitespace_feedback_never_reaches_backend() {
        let backend = ScriptedBackend::new(vec![ok("v0")]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        let before = s.state().clone();

        let err = s.refine(&refine_req("   ")).unwrap_err();
        assert!(matches!(err, PipegenError::EmptyFeedback));
        assert_eq!(backend.calls(), 1);
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn backend_failure_during_refine_leaves_state_unchanged() {
        let backend = ScriptedBackend::new(vec![ok("v0"), ok("v1"), outage()]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        s.refine(&refine_req("first")).unwrap();
        let before = s.state().clone();

        let err = s.refine(&refine_req("second")).unwrap_err();
        assert!(matches!(err, PipegenError::Backend(BackendError::Api { status: 503, .. })));
        assert_eq!(s.state(), &before);
        assert_eq!(s.iteration_count(), 1);
    }

    #[test]
    fn blank_answer_during_refine_leaves_state_unchanged() {
        let backend = ScriptedBackend::new(vec![ok("v0"), ok("v1"), ok(" \n\t ")]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        s.refine(&refine_req("first")).unwrap();
        let before = s.state().clone();

        let err = s.refine(&refine_req("second")).unwrap_err();
        assert!(matches!(err, PipegenError::EmptyResponse));
        assert_eq!(backend.calls(), 3);
        assert_eq!(s.state(), &before);
        assert_eq!(s.iteration_count(), 1);
        assert_eq!(s.artifact().unwrap().content, "v1");
    }

    #[test]
    fn backend_failure_during_generate_keeps_prior_artifact() {
        let backend = ScriptedBackend::new(vec![ok("v0"), ok("v1"), outage()]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        s.refine(&refine_req("first")).unwrap();
        let before = s.state().clone();

        assert!(s.generate(&gha_python()).is_err());
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn empty_answer_is_an_error_not_an_artifact() {
        let backend = ScriptedBackend::new(vec![ok("  \n\t ")]);
        let mut s = session(&backend);

        let err = s.generate(&gha_python()).unwrap_err();
        assert!(matches!(err, PipegenError::EmptyResponse));
        assert!(s.artifact().is_none());
    }

    #[test]
    fn answers_and_feedback_are_trimmed() {
        let backend = ScriptedBackend::new(vec![ok("\n\nname: ci\n\n"), ok("name: ci2  ")]);
        let mut s = session(&backend);
        assert_eq!(s.generate(&gha_python()).unwrap().content, "name: ci");

        s.refine(&refine_req("  add caching \n")).unwrap();
        assert!(backend.last_prompt().contains("Feedback: add caching\n"));
        assert_eq!(s.artifact().unwrap().content, "name: ci2");
    }

    #[test]
    fn refine_keeps_format_of_generated_tool() {
        let backend = ScriptedBackend::new(vec![ok("pipeline { }"), ok("pipeline { agent any }")]);
        let mut s = session(&backend);
        s.generate(&GenerationRequest {
            ci_tool: CiTool::Jenkins,
            ..gha_python()
        })
        .unwrap();

        // A different tool named at refine time only changes the prompt wording.
        let refined = s.refine(&refine_req("use any agent")).unwrap();
        assert_eq!(refined.ci_tool, CiTool::Jenkins);
        assert_eq!(refined.format, PipelineFormat::Groovy);
        assert_eq!(refined.download_filename(), "pipelineJenkinsfile");
        assert!(backend.last_prompt().contains("Refine the following GitHub Actions"));
    }

    #[test]
    fn seeded_state_can_be_refined() {
        let backend = ScriptedBackend::new(vec![ok("stages: [build, test]")]);
        let seeded =
            SessionState::with_artifact(PipelineArtifact::new(CiTool::GitLabCiCd, "stages: [build]"));
        let mut s = PromptSession::with_state(
            backend.clone(),
            Arc::new(PromptTemplates::default()),
            seeded,
        );
        let refined = s
            .refine(&RefinementRequest {
                feedback: "add a test stage".into(),
                ci_tool: CiTool::GitLabCiCd,
            })
            .unwrap();
        assert_eq!(refined.content, "stages: [build, test]");
        assert_eq!(s.iteration_count(), 1);
    }

    #[test]
    fn reset_clears_state() {
        let backend = ScriptedBackend::new(vec![ok("v0")]);
        let mut s = session(&backend);
        s.generate(&gha_python()).unwrap();
        s.reset();
        assert_eq!(s.state(), &SessionState::new());
    }
}
