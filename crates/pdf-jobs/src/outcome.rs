use crate::error::JobError;
use pdf_artifacts::{Artifact, WorkspaceConfig};
use serde::{Deserialize, Serialize};

/// Client-facing description of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub reference: String,
    pub file_name: String,
    pub download_url: String,
    pub size_bytes: u64,
}

impl ArtifactDescriptor {
    pub fn new(artifact: &Artifact, config: &WorkspaceConfig) -> Self {
        Self {
            reference: artifact.reference.clone(),
            file_name: artifact.file_name.clone(),
            download_url: config.download_url(&artifact.reference),
            size_bytes: artifact.size_bytes,
        }
    }
}

/// Result descriptor returned for every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDescriptor>,
}

impl JobOutcome {
    pub fn succeeded(message: impl Into<String>, artifacts: Vec<ArtifactDescriptor>) -> Self {
        Self {
            success: true,
            message: message.into(),
            artifacts,
        }
    }

    pub fn failed(error: &JobError) -> Self {
        Self {
            success: false,
            message: error.user_message(),
            artifacts: Vec::new(),
        }
    }

    pub fn to_json(&self) -> String {
        // a struct of strings and numbers always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let outcome = JobOutcome::succeeded(
            "done",
            vec![ArtifactDescriptor {
                reference: "abc_merged.pdf".to_string(),
                file_name: "merged.pdf".to_string(),
                download_url: "/download/abc_merged.pdf".to_string(),
                size_bytes: 42,
            }],
        );
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["artifacts"][0]["fileName"], "merged.pdf");
        assert_eq!(value["artifacts"][0]["downloadUrl"], "/download/abc_merged.pdf");
        assert_eq!(value["artifacts"][0]["sizeBytes"], 42);
    }

    #[test]
    fn test_failure_uses_user_message() {
        let outcome = JobOutcome::failed(&JobError::Validation("Password is required".to_string()));
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Password is required");
        assert!(outcome.artifacts.is_empty());
    }
}
