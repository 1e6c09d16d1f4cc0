use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipegenError;

/// Case-insensitive lookup by wire id or display label.
fn lookup<T: Copy>(
    all: &[T],
    s: &str,
    id: fn(T) -> &'static str,
    label: fn(T) -> &'static str,
) -> Option<T> {
    let needle = s.trim();
    all.iter()
        .copied()
        .find(|&v| id(v).eq_ignore_ascii_case(needle) || label(v).eq_ignore_ascii_case(needle))
}

// ---------------------------------------------------------------------------
// CiTool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CiTool {
    #[serde(rename = "azure-devops")]
    AzureDevOps,
    #[serde(rename = "jenkins")]
    Jenkins,
    #[serde(rename = "github-actions")]
    GitHubActions,
    #[serde(rename = "gitlab-ci")]
    GitLabCiCd,
}

impl CiTool {
    pub fn all() -> &'static [CiTool] {
        &[
            CiTool::AzureDevOps,
            CiTool::Jenkins,
            CiTool::GitHubActions,
            CiTool::GitLabCiCd,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CiTool::AzureDevOps => "azure-devops",
            CiTool::Jenkins => "jenkins",
            CiTool::GitHubActions => "github-actions",
            CiTool::GitLabCiCd => "gitlab-ci",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CiTool::AzureDevOps => "Azure DevOps",
            CiTool::Jenkins => "Jenkins",
            CiTool::GitHubActions => "GitHub Actions",
            CiTool::GitLabCiCd => "GitLab CI/CD",
        }
    }

    /// Jenkins pipelines are Groovy; every other supported tool is YAML.
    pub fn format(self) -> PipelineFormat {
        match self {
            CiTool::Jenkins => PipelineFormat::Groovy,
            CiTool::AzureDevOps | CiTool::GitHubActions | CiTool::GitLabCiCd => {
                PipelineFormat::Yaml
            }
        }
    }
}

impl fmt::Display for CiTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CiTool {
    type Err = PipegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(CiTool::all(), s, CiTool::as_str, CiTool::label)
            .ok_or_else(|| PipegenError::InvalidCiTool(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    DotNet,
    NodeJs,
    Python,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::Java,
            Language::DotNet,
            Language::NodeJs,
            Language::Python,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::DotNet => "dotnet",
            Language::NodeJs => "nodejs",
            Language::Python => "python",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::Java => "Java",
            Language::DotNet => ".NET",
            Language::NodeJs => "Node.js",
            Language::Python => "Python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = PipegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(Language::all(), s, Language::as_str, Language::label)
            .ok_or_else(|| PipegenError::InvalidLanguage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// BuildTool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    Maven,
    Gradle,
    MsBuild,
    Npm,
    Yarn,
    Pip,
}

impl BuildTool {
    pub fn all() -> &'static [BuildTool] {
        &[
            BuildTool::Maven,
            BuildTool::Gradle,
            BuildTool::MsBuild,
            BuildTool::Npm,
            BuildTool::Yarn,
            BuildTool::Pip,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildTool::Maven => "maven",
            BuildTool::Gradle => "gradle",
            BuildTool::MsBuild => "msbuild",
            BuildTool::Npm => "npm",
            BuildTool::Yarn => "yarn",
            BuildTool::Pip => "pip",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildTool::Maven => "Maven",
            BuildTool::Gradle => "Gradle",
            BuildTool::MsBuild => "MSBuild",
            BuildTool::Npm => "NPM",
            BuildTool::Yarn => "Yarn",
            BuildTool::Pip => "Pip",
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildTool {
    type Err = PipegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(BuildTool::all(), s, BuildTool::as_str, BuildTool::label)
            .ok_or_else(|| PipegenError::InvalidBuildTool(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// DeploymentTarget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTarget {
    Aks,
    OpenShift,
}

impl DeploymentTarget {
    pub fn all() -> &'static [DeploymentTarget] {
        &[DeploymentTarget::Aks, DeploymentTarget::OpenShift]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentTarget::Aks => "aks",
            DeploymentTarget::OpenShift => "openshift",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeploymentTarget::Aks => "AKS",
            DeploymentTarget::OpenShift => "OpenShift",
        }
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeploymentTarget {
    type Err = PipegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(
            DeploymentTarget::all(),
            s,
            DeploymentTarget::as_str,
            DeploymentTarget::label,
        )
        .ok_or_else(|| PipegenError::InvalidDeploymentTarget(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// PipelineFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineFormat {
    Yaml,
    Groovy,
}

impl PipelineFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineFormat::Yaml => "yaml",
            PipelineFormat::Groovy => "groovy",
        }
    }

    /// Appended to `pipeline` to form the download filename.
    pub fn file_extension(self) -> &'static str {
        match self {
            PipelineFormat::Yaml => ".yml",
            PipelineFormat::Groovy => "Jenkinsfile",
        }
    }
}

impl fmt::Display for PipelineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Choice sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub id: &'static str,
    pub label: &'static str,
}

/// Every selectable value, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceSets {
    pub ci_tools: Vec<Choice>,
    pub languages: Vec<Choice>,
    pub build_tools: Vec<Choice>,
    pub deployment_targets: Vec<Choice>,
}

pub fn choice_sets() -> ChoiceSets {
    ChoiceSets {
        ci_tools: CiTool::all()
            .iter()
            .map(|t| Choice { id: t.as_str(), label: t.label() })
            .collect(),
        languages: Language::all()
            .iter()
            .map(|l| Choice { id: l.as_str(), label: l.label() })
            .collect(),
        build_tools: BuildTool::all()
            .iter()
            .map(|b| Choice { id: b.as_str(), label: b.label() })
            .collect(),
        deployment_targets: DeploymentTarget::all()
            .iter()
            .map(|d| Choice { id: d.as_str(), label: d.label() })
            .collect(),
    }
}
