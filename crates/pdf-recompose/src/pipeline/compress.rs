use super::{Recomposition, derived_name};
use crate::encode::{CompressionLevel, EncodeOptions};
use crate::plan::CompositionPlan;
use crate::source::SourceDocument;
use crate::types::Result;

/// Rewrite the document page by page with the encoding for `level`
pub fn compress(source: &SourceDocument, level: CompressionLevel) -> Result<Recomposition> {
    let plan = CompositionPlan::from_templates(derived_name("compressed", source), source.import_all()?);
    Ok(Recomposition::single(
        plan,
        EncodeOptions::for_level(level),
        source.page_count(),
    ))
}
