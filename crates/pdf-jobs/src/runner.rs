//! Request execution: validate, stage, plan, compose, persist

use crate::error::{ErrorKind, JobError};
use crate::outcome::{ArtifactDescriptor, JobOutcome};
use crate::request::{JobRequest, SplitAction, Upload};
use crate::validate::validate_request;
use pdf_artifacts::{Artifact, Download, LifecycleManager, StagedFile};
use pdf_recompose::pipeline::images_to_pdf;
use pdf_recompose::{
    CompositionPlan, EncodeOptions, Operation, RecomposeError, SourceDocument, compose_to_bytes,
};
use std::path::PathBuf;

/// What a finished job produced
struct Produced {
    artifacts: Vec<Artifact>,
    source_pages: u32,
}

pub struct JobRunner {
    lifecycle: LifecycleManager,
}

impl JobRunner {
    pub fn new(lifecycle: LifecycleManager) -> Self {
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Execute a request. On failure nothing it created is left on disk.
    pub async fn run(&self, request: JobRequest) -> Result<JobOutcome, JobError> {
        validate_request(&request, self.lifecycle.config())?;
        self.sweep_opportunistically().await;

        log::info!(
            "running {} job ({} uploads)",
            request.name(),
            request.uploads().len()
        );

        let produced = match request.operation() {
            Some(operation) => self.recompose(request.uploads(), operation).await,
            None => self.convert_images(request.uploads()).await,
        };

        match produced {
            Ok(produced) => {
                let config = self.lifecycle.config();
                let artifacts = produced
                    .artifacts
                    .iter()
                    .map(|artifact| ArtifactDescriptor::new(artifact, config))
                    .collect::<Vec<_>>();
                let message = success_message(&request, &produced, artifacts.len());
                Ok(JobOutcome::succeeded(message, artifacts))
            }
            Err(err) => {
                match err.kind() {
                    ErrorKind::Io | ErrorKind::Defect => {
                        log::error!("{} job failed: {}", request.name(), err)
                    }
                    _ => log::info!("{} job rejected: {}", request.name(), err),
                }
                Err(err)
            }
        }
    }

    /// One-time download of a finished artifact
    pub async fn download(&self, reference: &str) -> Result<Download, JobError> {
        Ok(self.lifecycle.stream_and_delete(reference).await?)
    }

    async fn sweep_opportunistically(&self) {
        let report = self.lifecycle.sweep().await;
        if report.failures > 0 {
            log::warn!("retention sweep hit {} failures", report.failures);
        }
    }

    async fn stage_all(&self, uploads: &[&Upload]) -> Result<Vec<StagedFile>, JobError> {
        let mut staged = Vec::with_capacity(uploads.len());
        for upload in uploads {
            staged.push(
                self.lifecycle
                    .stage(&upload.bytes, &upload.original_name)
                    .await?,
            );
        }
        Ok(staged)
    }

    async fn recompose(&self, uploads: Vec<&Upload>, operation: Operation) -> Result<Produced, JobError> {
        let staged = self.stage_all(&uploads).await?;

        let mut sources = Vec::with_capacity(staged.len());
        for file in &staged {
            let source = SourceDocument::open(file.path()).await?;
            sources.push(source.named(file.original_name()));
        }

        let recomposition = operation.plan(&sources)?;

        // templates are held in memory from here on
        for file in staged {
            file.consume().await?;
        }

        let artifacts = self
            .persist_all(recomposition.plans, &recomposition.encoding)
            .await;
        drop(sources);

        Ok(Produced {
            artifacts: artifacts?,
            source_pages: recomposition.source_pages,
        })
    }

    async fn convert_images(&self, uploads: Vec<&Upload>) -> Result<Produced, JobError> {
        let staged = self.stage_all(&uploads).await?;
        let paths: Vec<PathBuf> = staged.iter().map(|file| file.path().to_owned()).collect();

        let recomposition = tokio::task::spawn_blocking(move || images_to_pdf(&paths))
            .await
            .map_err(RecomposeError::from)??;
        let artifacts = self
            .persist_all(recomposition.plans, &recomposition.encoding)
            .await?;

        for file in staged {
            if let Err(err) = file.consume().await {
                log::warn!("{}", err);
            }
        }

        Ok(Produced {
            artifacts,
            source_pages: recomposition.source_pages,
        })
    }

    /// Compose, encode and persist every plan. Either all artifacts are
    /// persisted or none remain.
    async fn persist_all(
        &self,
        plans: Vec<CompositionPlan>,
        encoding: &EncodeOptions,
    ) -> Result<Vec<Artifact>, JobError> {
        let mut persisted: Vec<Artifact> = Vec::with_capacity(plans.len());

        for plan in plans {
            let file_name = plan.file_name().to_string();
            let result = match compose_to_bytes(plan, encoding.clone()).await {
                Ok(bytes) => self
                    .lifecycle
                    .persist(bytes, &file_name)
                    .await
                    .map_err(JobError::from),
                Err(err) => Err(JobError::from(err)),
            };

            match result {
                Ok(artifact) => persisted.push(artifact),
                Err(err) => {
                    log::warn!(
                        "{} failed, rolling back {} artifacts",
                        file_name,
                        persisted.len()
                    );
                    for artifact in &persisted {
                        if let Err(discard_err) = self.lifecycle.discard(artifact).await {
                            log::warn!("{}", discard_err);
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(persisted)
    }
}

fn success_message(request: &JobRequest, produced: &Produced, files: usize) -> String {
    match request {
        JobRequest::Merge { files: inputs } => format!(
            "Successfully merged {} files into {} pages",
            inputs.len(),
            produced.source_pages
        ),
        JobRequest::Split {
            action: SplitAction::ByPages { .. },
            ..
        } => format!(
            "Successfully split {} pages into {} files",
            produced.source_pages, files
        ),
        JobRequest::Split {
            action: SplitAction::ByRange { .. },
            ..
        } => format!("Successfully created {} PDF files from specified ranges", files),
        JobRequest::Number { .. } => "Page numbers added successfully".to_string(),
        JobRequest::Compress { .. } => "PDF compressed successfully".to_string(),
        JobRequest::Protect { .. } => "PDF protected successfully".to_string(),
        JobRequest::ImagesToPdf { images } => {
            format!("Successfully converted {} images to PDF", images.len())
        }
    }
}
