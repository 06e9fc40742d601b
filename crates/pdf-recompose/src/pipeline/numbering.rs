use super::{Recomposition, derived_name};
use crate::encode::EncodeOptions;
use crate::plan::{CompositionInstruction, CompositionPlan, OverlayText};
use crate::source::SourceDocument;
use crate::types::Result;

/// Copy every page and stamp "Page N" near its top-right corner
pub fn number_pages(source: &SourceDocument) -> Result<Recomposition> {
    let mut plan = CompositionPlan::new(derived_name("numbered", source));

    for (index, template) in source.import_all()?.into_iter().enumerate() {
        let instruction = CompositionInstruction::template(template);
        let overlay = OverlayText::page_number(index + 1, &instruction.size);
        plan.push(instruction.with_overlay(overlay));
    }

    Ok(Recomposition::single(
        plan,
        EncodeOptions::default(),
        source.page_count(),
    ))
}
