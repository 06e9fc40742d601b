use super::Recomposition;
use crate::encode::EncodeOptions;
use crate::plan::CompositionPlan;
use crate::source::SourceDocument;
use crate::types::{Result, ValidationError};

/// Output name of a merged document
pub const MERGED_FILE_NAME: &str = "merged.pdf";

/// Concatenate every page of every source, in input order, each at its own
/// size.
pub fn merge(sources: &[SourceDocument]) -> Result<Recomposition> {
    if sources.is_empty() {
        return Err(ValidationError::new("Please upload at least one PDF file").into());
    }

    let mut templates = Vec::new();
    for source in sources {
        templates.extend(source.import_all()?);
    }
    let source_pages = templates.len() as u32;

    log::info!("merging {} documents ({} pages)", sources.len(), source_pages);

    Ok(Recomposition::single(
        CompositionPlan::from_templates(MERGED_FILE_NAME, templates),
        EncodeOptions::default(),
        source_pages,
    ))
}
