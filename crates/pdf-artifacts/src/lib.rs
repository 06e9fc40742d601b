mod config;
mod error;
mod manager;
pub mod naming;
mod staging;
mod sweep;

pub use config::{DEFAULT_MAX_UPLOAD_BYTES, RetentionPolicy, WorkspaceConfig};
pub use error::{ArtifactError, Result};
pub use manager::{Artifact, ArtifactState, Download, LifecycleManager};
pub use staging::StagedFile;
pub use sweep::SweepReport;
