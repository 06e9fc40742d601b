//! Request validation. Runs before anything touches the filesystem.

use crate::error::JobError;
use crate::request::{JobRequest, Upload};
use pdf_artifacts::WorkspaceConfig;
use pdf_recompose::is_supported_image;

/// Accepted image extensions (lowercase)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

const PDF_HEADER_WINDOW: usize = 1024;

pub fn validate_request(request: &JobRequest, config: &WorkspaceConfig) -> Result<(), JobError> {
    match request {
        JobRequest::Merge { files } if files.is_empty() => {
            return Err(invalid("Please upload at least one PDF file"));
        }
        JobRequest::ImagesToPdf { images } if images.is_empty() => {
            return Err(invalid("Please upload at least one image"));
        }
        _ => {}
    }

    for upload in request.uploads() {
        check_size(upload, config.max_upload_bytes)?;
        match request {
            JobRequest::ImagesToPdf { .. } => check_image(upload)?,
            _ => check_pdf(upload)?,
        }
    }

    if let Some(operation) = request.operation() {
        operation.validate()?;
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> JobError {
    JobError::Validation(message.into())
}

fn extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn check_size(upload: &Upload, max_bytes: u64) -> Result<(), JobError> {
    if upload.bytes.len() as u64 > max_bytes {
        return Err(invalid(format!(
            "{} is too large (limit {} MB)",
            upload.original_name,
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

fn check_pdf(upload: &Upload) -> Result<(), JobError> {
    if extension(&upload.original_name).as_deref() != Some("pdf") {
        return Err(invalid(format!(
            "{} is not a PDF file",
            upload.original_name
        )));
    }
    if upload.bytes.is_empty() {
        return Err(invalid("The PDF file is empty or corrupted"));
    }
    let window = &upload.bytes[..upload.bytes.len().min(PDF_HEADER_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(invalid(format!(
            "{} is not a valid PDF file",
            upload.original_name
        )));
    }
    Ok(())
}

fn check_image(upload: &Upload) -> Result<(), JobError> {
    let ext = extension(&upload.original_name).unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(invalid(format!(
            "{} has an unsupported format; allowed: {}",
            upload.original_name,
            IMAGE_EXTENSIONS.join(", ")
        )));
    }
    if !is_supported_image(&upload.bytes) {
        return Err(invalid(format!(
            "{} is not a valid image file",
            upload.original_name
        )));
    }
    Ok(())
}
