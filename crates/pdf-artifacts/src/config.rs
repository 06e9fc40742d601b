//! Workspace configuration: where files live and how long they are kept

use crate::error::{ArtifactError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default upload size limit (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// How long files may sit on disk before the sweep removes them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RetentionPolicy {
    /// Staged uploads, in seconds when serialized
    #[cfg_attr(feature = "serde", serde(with = "duration_secs"))]
    pub staging: Duration,
    /// Persisted artifacts awaiting download
    #[cfg_attr(feature = "serde", serde(with = "duration_secs"))]
    pub artifacts: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            staging: Duration::from_secs(15 * 60),
            artifacts: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct WorkspaceConfig {
    /// Transient copies of uploads
    pub staging_dir: PathBuf,
    /// Finished artifacts awaiting download
    pub output_dir: PathBuf,
    pub retention: RetentionPolicy,
    pub max_upload_bytes: u64,
    /// Prefix of the download link reported for each artifact
    pub download_base_url: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
            retention: RetentionPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            download_base_url: "/download".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Load configuration from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(ArtifactError::io(path))?;
        let config = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ArtifactError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await.map_err(ArtifactError::io(path))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.staging_dir.as_os_str().is_empty() || self.output_dir.as_os_str().is_empty() {
            return Err(ArtifactError::Config(
                "Staging and output directories must be set".to_string(),
            ));
        }
        if self.staging_dir == self.output_dir {
            return Err(ArtifactError::Config(
                "Staging and output directories must differ".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ArtifactError::Config(
                "Upload limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Download link reported for an artifact reference
    pub fn download_url(&self, reference: &str) -> String {
        format!("{}/{}", self.download_base_url.trim_end_matches('/'), reference)
    }
}

#[cfg(feature = "serde")]
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.retention.staging, Duration::from_secs(900));
        assert_eq!(config.retention.artifacts, Duration::from_secs(86_400));
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_shared_directory() {
        let config = WorkspaceConfig {
            staging_dir: PathBuf::from("files"),
            output_dir: PathBuf::from("files"),
            ..WorkspaceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_download_url() {
        let config = WorkspaceConfig {
            download_base_url: "https://example.org/get/".to_string(),
            ..WorkspaceConfig::default()
        };
        assert_eq!(config.download_url("abc_x.pdf"), "https://example.org/get/abc_x.pdf");
    }

    #[cfg(feature = "serde")]
    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");

        let config = WorkspaceConfig {
            max_upload_bytes: 1024,
            retention: RetentionPolicy {
                staging: Duration::from_secs(60),
                artifacts: Duration::from_secs(3600),
            },
            ..WorkspaceConfig::default()
        };
        config.save(&path).await.unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"staging\": 60"));
        assert!(json.contains("\"maxUploadBytes\": 1024"));

        let loaded = WorkspaceConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WorkspaceConfig = serde_json::from_str(r#"{ "outputDir": "/srv/out" }"#).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.staging_dir, PathBuf::from("uploads"));
    }
}
