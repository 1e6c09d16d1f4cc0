use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{BuildTool, CiTool, DeploymentTarget, Language};

/// Used when the instruction table has no entry for the selected tool.
pub const GENERIC_INSTRUCTION: &str =
    "Provide a structured pipeline file in the appropriate format.";

const READABILITY: &str =
    "Ensure the output is structured properly and easy to read, using clear formatting.";

const BEST_PRACTICES: &str = "Include best practices such as caching dependencies, parallel \
     execution, unit testing, security scans, artifact storage, rollback strategies, and \
     containerization using Docker.";

const REFINE_GUIDANCE: &str = "Ensure the output remains structured, clean, and easy to read.\n\
     Improve security, efficiency, maintainability, and ensure best practices in CI/CD.\n\
     Output only the updated configuration.";

fn default_instruction(tool: CiTool) -> &'static str {
    match tool {
        CiTool::AzureDevOps => {
            "Generate a YAML pipeline file (.yml) with appropriate stages for build, test, \
             security scan, artifact upload, containerization, and deployment."
        }
        CiTool::Jenkins => {
            "Generate a Jenkinsfile written in Groovy format for declarative pipelines, \
             including build, test, security scanning, artifact storage, and deployment."
        }
        CiTool::GitHubActions => {
            "Generate a YAML workflow file (.yml) for GitHub Actions, ensuring proper job \
             separation for build, test, security, and deployment."
        }
        CiTool::GitLabCiCd => {
            "Generate a YAML pipeline (.gitlab-ci.yml) for GitLab CI/CD, incorporating best \
             practices for testing, security scanning, and deployment."
        }
    }
}

/// Per-tool format instructions used to build the generate prompt.
///
/// A table loaded from config replaces the defaults wholesale; tools missing
/// from it fall back to [`GENERIC_INSTRUCTION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplates {
    #[serde(default = "default_instructions")]
    pub instructions: BTreeMap<CiTool, String>,
}

fn default_instructions() -> BTreeMap<CiTool, String> {
    CiTool::all()
        .iter()
        .map(|&t| (t, default_instruction(t).to_string()))
        .collect()
}

impl Default for PromptTemplates {
    fn default() -> Self {
        PromptTemplates {
            instructions: default_instructions(),
        }
    }
}

impl PromptTemplates {
    pub fn instruction_for(&self, tool: CiTool) -> &str {
        self.instructions
            .get(&tool)
            .map(String::as_str)
            .unwrap_or(GENERIC_INSTRUCTION)
    }

    pub fn generate_prompt(
        &self,
        ci_tool: CiTool,
        language: Language,
        build_tool: BuildTool,
        target: DeploymentTarget,
    ) -> String {
        [
            format!(
                "Generate a {} CI/CD pipeline for a {} project using {}.",
                ci_tool.label(),
                language.label(),
                build_tool.label()
            ),
            self.instruction_for(ci_tool).to_string(),
            READABILITY.to_string(),
            BEST_PRACTICES.to_string(),
            format!("Deploy to {} (AKS/OpenShift).", target.label()),
        ]
        .join("\n")
    }

    pub fn refine_prompt(&self, ci_tool: CiTool, feedback: &str, pipeline: &str) -> String {
        format!(
            "Refine the following {} CI/CD pipeline based on this user feedback:\n\n\
             Feedback: {feedback}\n\n\
             Pipeline:\n{pipeline}\n\n\
             {REFINE_GUIDANCE}",
            ci_tool.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_prompt_uses_labels_and_tool_instruction() {
        let prompt = PromptTemplates::default().generate_prompt(
            CiTool::GitHubActions,
            Language::Python,
            BuildTool::Pip,
            DeploymentTarget::Aks,
        );
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(
            lines[0],
            "Generate a GitHub Actions CI/CD pipeline for a Python project using Pip."
        );
        assert!(lines[1].starts_with("Generate a YAML workflow file (.yml) for GitHub Actions"));
        assert_eq!(lines[2], READABILITY);
        assert!(lines[3].contains("rollback strategies"));
        assert_eq!(lines[4], "Deploy to AKS (AKS/OpenShift).");
    }

    #[test]
    fn jenkins_prompt_asks_for_groovy() {
        let prompt = PromptTemplates::default().generate_prompt(
            CiTool::Jenkins,
            Language::Java,
            BuildTool::Maven,
            DeploymentTarget::OpenShift,
        );
        assert!(prompt.contains("Jenkinsfile written in Groovy"));
        assert!(prompt.contains("for a Java project using Maven"));
        assert!(prompt.contains("Deploy to OpenShift"));
    }

    #[test]
    fn every_tool_has_a_default_instruction() {
        let templates = PromptTemplates::default();
        for &tool in CiTool::all() {
            assert_ne!(templates.instruction_for(tool), GENERIC_INSTRUCTION);
        }
    }

    #[test]
    fn missing_entry_falls_back_to_generic() {
        let mut templates = PromptTemplates::default();
        templates.instructions.remove(&CiTool::GitLabCiCd);
        assert_eq!(templates.instruction_for(CiTool::GitLabCiCd), GENERIC_INSTRUCTION);
        let prompt = templates.generate_prompt(
            CiTool::GitLabCiCd,
            Language::NodeJs,
            BuildTool::Yarn,
            DeploymentTarget::Aks,
        );
        assert!(prompt.contains(GENERIC_INSTRUCTION));
    }

    #[test]
    fn refine_prompt_embeds_feedback_and_pipeline() {
        let prompt = PromptTemplates::default().refine_prompt(
            CiTool::AzureDevOps,
            "add caching",
            "trigger:\n  - main",
        );
        assert!(prompt.starts_with(
            "Refine the following Azure DevOps CI/CD pipeline based on this user feedback:\n\n"
        ));
        assert!(prompt.contains("Feedback: add caching\n\n"));
        assert!(prompt.contains("Pipeline:\ntrigger:\n  - main\n\n"));
        assert!(prompt.ends_with("Output only the updated configuration."));
    }

    #[test]
    fn configured_table_replaces_defaults() {
        let yaml = "instructions:\n  jenkins: Use scripted pipeline syntax.\n";
        let templates: PromptTemplates = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(templates.instruction_for(CiTool::Jenkins), "Use scripted pipeline syntax.");
        assert_eq!(templates.instruction_for(CiTool::AzureDevOps), GENERIC_INSTRUCTION);
    }
}
