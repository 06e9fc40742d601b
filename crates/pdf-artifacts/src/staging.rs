use crate::error::{ArtifactError, Result};
use std::path::{Path, PathBuf};

/// A transient copy of an upload. The file is deleted when the guard is
/// dropped, unless [`StagedFile::consume`] already removed it.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    original_name: String,
    removed: bool,
}

impl StagedFile {
    pub(crate) fn new(path: PathBuf, original_name: String) -> Self {
        Self {
            path,
            original_name,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the file was uploaded under
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Delete the staged file now
    pub async fn consume(mut self) -> Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                log::debug!("removed staged file {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ArtifactError::io(&self.path)(err)),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("discarded staged file {}", self.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!(
                "cannot remove staged file {}: {}; leaving it for the sweep",
                self.path.display(),
                err
            ),
        }
    }
}
