use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io;
use crate::types::{CiTool, PipelineFormat};

/// MIME type of a downloaded pipeline file.
pub const CONTENT_TYPE: &str = "text/plain";

/// Generated pipeline text plus the metadata needed to save it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub content: String,
    pub format: PipelineFormat,
    pub file_extension: String,
    /// Tool the pipeline was generated for.
    pub ci_tool: CiTool,
}

impl PipelineArtifact {
    /// Build an artifact for `ci_tool`, deriving format and extension from it.
    pub fn new(ci_tool: CiTool, content: impl Into<String>) -> Self {
        let format = ci_tool.format();
        PipelineArtifact {
            content: content.into(),
            format,
            file_extension: format.file_extension().to_string(),
            ci_tool,
        }
    }

    /// `pipeline` followed by the extension, e.g. `pipeline.yml` or
    /// `pipelineJenkinsfile`.
    pub fn download_filename(&self) -> String {
        format!("pipeline{}", self.file_extension)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.content.as_bytes().to_vec()
    }

    /// Write the artifact into `dir` under its download filename.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.download_filename());
        io::atomic_write(&path, self.content.as_bytes())?;
        Ok(path)
    }
}
