use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;

use super::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Yaml => "application/x-yaml",
        }
    }

    pub(crate) fn render(&self, spec: &Value) -> Result<Vec<u8>, PipelineError> {
        match self {
            ExportFormat::Json => serde_json::to_vec_pretty(spec)
                .map_err(|e| PipelineError::Export(format!("json encoding failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(spec)
                .map(String::into_bytes)
                .map_err(|e| PipelineError::Export(format!("yaml encoding failed: {e}"))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    /// Suggested download name, `architecture-<job>.<ext>`.
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Copy written under the job's `exports/` directory.
    pub path: PathBuf,
}
