use pdf_artifacts::ArtifactError;
use pdf_recompose::{CompositionError, OpenError, RecomposeError};
use thiserror::Error;

/// Message shown for sources that parse badly or are encrypted
pub const UNREADABLE_PDF_MESSAGE: &str =
    "PDF is corrupted or password-protected. Please unlock it first.";

const EMPTY_PDF_MESSAGE: &str = "The PDF file is empty or corrupted";
const UNREADABLE_IMAGE_MESSAGE: &str = "The image file is corrupted or in an unsupported format";
const SERVER_ERROR_MESSAGE: &str = "Server error, please try again later.";
const NOT_FOUND_MESSAGE: &str = "File not found";

#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Recompose(#[from] RecomposeError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Coarse classification of a [`JobError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad parameters or uploads; never retried
    Validation,
    /// A source that cannot be read as a paged document or image
    Unreadable,
    /// Unknown or already consumed download reference
    NotFound,
    /// Filesystem trouble
    Io,
    /// A bug or an unexpected document structure
    Defect,
}

impl From<pdf_recompose::ValidationError> for JobError {
    fn from(err: pdf_recompose::ValidationError) -> Self {
        JobError::Validation(err.0)
    }
}

impl From<OpenError> for JobError {
    fn from(err: OpenError) -> Self {
        JobError::Recompose(err.into())
    }
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation(_) => ErrorKind::Validation,
            JobError::Recompose(err) => match err {
                RecomposeError::Validation(_) => ErrorKind::Validation,
                RecomposeError::Open(OpenError::Io { .. }) => ErrorKind::Io,
                RecomposeError::Open(OpenError::TaskJoin(_)) => ErrorKind::Defect,
                RecomposeError::Open(_) | RecomposeError::Import(_) => ErrorKind::Unreadable,
                RecomposeError::Composition(CompositionError::Image { .. }) => ErrorKind::Unreadable,
                RecomposeError::Composition(CompositionError::ImageIo { .. }) => ErrorKind::Io,
                RecomposeError::Composition(_)
                | RecomposeError::Encode(_)
                | RecomposeError::TaskJoin(_) => ErrorKind::Defect,
            },
            JobError::Artifact(ArtifactError::NotFound(_)) => ErrorKind::NotFound,
            JobError::Artifact(_) => ErrorKind::Io,
        }
    }

    /// HTTP-style status for front ends that speak HTTP
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Unreadable => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Io | ErrorKind::Defect => 500,
        }
    }

    /// Message safe to show to the person who sent the request
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Unreadable => match self {
                JobError::Recompose(RecomposeError::Open(OpenError::Empty { .. })) => {
                    EMPTY_PDF_MESSAGE.to_string()
                }
                JobError::Recompose(RecomposeError::Composition(_)) => {
                    UNREADABLE_IMAGE_MESSAGE.to_string()
                }
                _ => UNREADABLE_PDF_MESSAGE.to_string(),
            },
            ErrorKind::NotFound => NOT_FOUND_MESSAGE.to_string(),
            ErrorKind::Io | ErrorKind::Defect => SERVER_ERROR_MESSAGE.to_string(),
        }
    }
}
