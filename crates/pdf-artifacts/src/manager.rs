//! The lifecycle manager: staging, persistence, one-shot download and
//! retention

use crate::config::{RetentionPolicy, WorkspaceConfig};
use crate::error::{ArtifactError, Result};
use crate::naming::{is_valid_reference, new_token, original_name_of, sanitize_file_name, unique_name};
use crate::staging::StagedFile;
use crate::sweep::{SweepReport, sweep_dir};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Download state of a persisted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Ready,
    Consumed,
}

/// A finished output file awaiting download
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Opaque download reference; also the file name in the output directory
    pub reference: String,
    pub path: PathBuf,
    /// Sanitized name the artifact is offered under
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Bytes of a downloaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Record {
    state: ArtifactState,
    created_at: DateTime<Utc>,
}

pub struct LifecycleManager {
    config: WorkspaceConfig,
    registry: Mutex<HashMap<String, Record>>,
}

impl LifecycleManager {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Create the staging and output directories
    pub async fn prepare(&self) -> Result<()> {
        for dir in [&self.config.staging_dir, &self.config.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(ArtifactError::io(dir))?;
        }
        Ok(())
    }

    /// Write an upload to a uniquely named file in the staging directory
    pub async fn stage(&self, bytes: &[u8], original_name: &str) -> Result<StagedFile> {
        let path = self.config.staging_dir.join(unique_name(original_name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(ArtifactError::io(&path))?;
        log::debug!("staged {} as {}", original_name, path.display());
        Ok(StagedFile::new(path, original_name.to_string()))
    }

    /// Store finished output bytes as a downloadable artifact.
    ///
    /// The file only appears under its final name once fully written.
    pub async fn persist(&self, bytes: Vec<u8>, file_name: &str) -> Result<Artifact> {
        let reference = unique_name(file_name);
        let path = self.config.output_dir.join(&reference);
        let temp = self.config.output_dir.join(format!(".{}.tmp", reference));

        let size_bytes = bytes.len() as u64;
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(ArtifactError::io(&temp))?;
        if let Err(err) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ArtifactError::io(&path)(err));
        }

        let created_at = Utc::now();
        self.registry().insert(
            reference.clone(),
            Record {
                state: ArtifactState::Ready,
                created_at,
            },
        );
        log::info!("persisted artifact {} ({} bytes)", reference, size_bytes);

        Ok(Artifact {
            file_name: sanitize_file_name(file_name),
            reference,
            path,
            size_bytes,
            created_at,
        })
    }

    /// Remove a persisted artifact that will never be handed out
    pub async fn discard(&self, artifact: &Artifact) -> Result<()> {
        self.registry().remove(&artifact.reference);
        match tokio::fs::remove_file(&artifact.path).await {
            Ok(()) => {
                log::info!("discarded artifact {}", artifact.reference);
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ArtifactError::io(&artifact.path)(err)),
        }
    }

    /// Current state of `reference`, if the file or a record of it exists
    pub async fn state(&self, reference: &str) -> Option<ArtifactState> {
        if !is_valid_reference(reference) {
            return None;
        }
        let known = self.registry().get(reference).map(|record| record.state);
        if known.is_some() {
            return known;
        }
        let exists = tokio::fs::try_exists(self.config.output_dir.join(reference))
            .await
            .unwrap_or(false);
        exists.then_some(ArtifactState::Ready)
    }

    /// Hand out an artifact exactly once, deleting it afterwards.
    ///
    /// The artifact is claimed by renaming it out of its published name,
    /// so only one caller can win even across processes sharing the
    /// output directory.
    pub async fn stream_and_delete(&self, reference: &str) -> Result<Download> {
        let not_found = || ArtifactError::NotFound(reference.to_string());
        if !is_valid_reference(reference) {
            return Err(not_found());
        }

        let previous = {
            let mut registry = self.registry();
            let previous = registry.get(reference).cloned();
            if matches!(&previous, Some(record) if record.state == ArtifactState::Consumed) {
                return Err(not_found());
            }
            registry.insert(
                reference.to_string(),
                Record {
                    state: ArtifactState::Consumed,
                    created_at: previous.as_ref().map(|r| r.created_at).unwrap_or_else(Utc::now),
                },
            );
            previous
        };

        let path = self.config.output_dir.join(reference);
        let claim = self
            .config
            .output_dir
            .join(format!(".{}.{}.claim", reference, new_token()));

        if let Err(err) = claim_file(&path, &claim).await {
            self.restore(reference, previous);
            if err.kind() == std::io::ErrorKind::NotFound {
                return Err(not_found());
            }
            return Err(ArtifactError::io(&path)(err));
        }

        let bytes = match tokio::fs::read(&claim).await {
            Ok(bytes) => bytes,
            Err(err) => {
                if tokio::fs::rename(&claim, &path).await.is_ok() {
                    self.restore(reference, previous);
                }
                return Err(ArtifactError::io(&claim)(err));
            }
        };

        if let Err(err) = tokio::fs::remove_file(&claim).await {
            log::warn!("cannot remove claimed artifact {}: {}", claim.display(), err);
        }
        log::info!("delivered artifact {} ({} bytes)", reference, bytes.len());

        Ok(Download {
            file_name: original_name_of(reference).to_string(),
            bytes,
        })
    }

    /// Sweep with the configured retention windows
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_with(&self.config.retention).await
    }

    /// Delete staged files and artifacts older than the given windows and
    /// forget registry entries for files that are gone.
    pub async fn sweep_with(&self, retention: &RetentionPolicy) -> SweepReport {
        let staged = sweep_dir(&self.config.staging_dir, retention.staging).await;
        let artifacts = sweep_dir(&self.config.output_dir, retention.artifacts).await;

        let references: Vec<String> = self.registry().keys().cloned().collect();
        let mut gone = Vec::new();
        for reference in references {
            let exists = tokio::fs::try_exists(self.config.output_dir.join(&reference))
                .await
                .unwrap_or(true);
            if !exists {
                gone.push(reference);
            }
        }
        let window = chrono::Duration::from_std(retention.artifacts).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();
        {
            let mut registry = self.registry();
            for reference in gone {
                // consumed records outlive their file until the window passes,
                // so repeated downloads keep failing the same way
                let expired = registry
                    .get(&reference)
                    .map(|r| r.state == ArtifactState::Ready || now - r.created_at > window)
                    .unwrap_or(false);
                if expired {
                    registry.remove(&reference);
                }
            }
        }

        let report = SweepReport {
            staged_removed: staged.removed,
            artifacts_removed: artifacts.removed,
            failures: staged.failures + artifacts.failures,
        };
        if report.total_removed() > 0 || report.failures > 0 {
            log::info!(
                "sweep removed {} staged files and {} artifacts ({} failures)",
                report.staged_removed,
                report.artifacts_removed,
                report.failures
            );
        }
        report
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.staging_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    fn restore(&self, reference: &str, previous: Option<Record>) {
        let mut registry = self.registry();
        match previous {
            Some(record) => {
                registry.insert(reference.to_string(), record);
            }
            None => {
                registry.remove(reference);
            }
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Record>> {
        // the map stays consistent even if a holder panicked
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Move `path` to its private claim name and restart its retention clock,
/// so a sweep running during the download leaves it alone.
async fn claim_file(path: &Path, claim: &Path) -> std::io::Result<()> {
    tokio::fs::rename(path, claim).await?;
    if let Err(err) = touch(claim).await {
        log::warn!("cannot refresh mtime of {}: {}", claim.display(), err);
    }
    Ok(())
}

async fn touch(path: &Path) -> std::io::Result<()> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await?
        .into_std()
        .await;
    tokio::task::spawn_blocking(move || file.set_modified(std::time::SystemTime::now()))
        .await
        .map_err(std::io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[tokio::test]
    async fn test_claimed_file_survives_sweep() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("abc_report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(an_hour_ago)
            .unwrap();

        let claim = dir.path().join(".abc_report.pdf.x.claim");
        claim_file(&path, &claim).await.unwrap();

        let swept = sweep_dir(dir.path(), Duration::from_secs(60)).await;
        assert_eq!(swept.removed, 0);
        assert!(claim.exists());
        assert!(!path.exists());
    }
}
