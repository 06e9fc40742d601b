use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ArtifactError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
