mod error;
mod outcome;
mod request;
mod runner;
pub mod validate;

pub use error::{ErrorKind, JobError, UNREADABLE_PDF_MESSAGE};
pub use outcome::{ArtifactDescriptor, JobOutcome};
pub use request::{JobRequest, Password, SplitAction, Upload};
pub use runner::JobRunner;

// Re-export types callers need to build requests and configure the runner
pub use pdf_artifacts::{Download, LifecycleManager, RetentionPolicy, SweepReport, WorkspaceConfig};
pub use pdf_recompose::{CompressionLevel, PageRange};
