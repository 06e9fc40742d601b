//! Composition plans: ordered instructions describing one output document

use crate::constants::{PAGE_NUMBER_INSET_MM, PAGE_NUMBER_LABEL, mm_to_pt};
use crate::source::PageTemplate;
use crate::types::PageSize;
use std::path::PathBuf;

/// Where overlay text sits relative to its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Anchor is the top-right corner of the text box
    #[default]
    TopRight,
    /// Anchor is the top-left corner of the text box
    TopLeft,
}

/// Text drawn above the page content
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    /// Anchor in output page coordinates (points, origin bottom-left)
    pub anchor: (f32, f32),
    pub alignment: Alignment,
}

impl OverlayText {
    /// "Page N" label anchored near the top-right corner of a page
    pub fn page_number(number: usize, size: &PageSize) -> Self {
        let inset = mm_to_pt(PAGE_NUMBER_INSET_MM);
        Self {
            text: format!("{} {}", PAGE_NUMBER_LABEL, number),
            anchor: (size.width - inset, size.height - inset),
            alignment: Alignment::TopRight,
        }
    }
}

/// A raster image placed on its own page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub path: PathBuf,
    /// Stretch over the whole page instead of fitting with preserved aspect
    pub full_bleed: bool,
}

#[derive(Debug, Clone)]
pub enum PageContent {
    Template(PageTemplate),
    Image(ImageSource),
}

/// One output page: its size, what goes on it and an optional overlay
#[derive(Debug, Clone)]
pub struct CompositionInstruction {
    pub size: PageSize,
    pub content: PageContent,
    pub overlay: Option<OverlayText>,
}

impl CompositionInstruction {
    /// Place a template at the origin on a page of the template's own size
    pub fn template(template: PageTemplate) -> Self {
        Self {
            size: template.size(),
            content: PageContent::Template(template),
            overlay: None,
        }
    }

    pub fn image(source: ImageSource, size: PageSize) -> Self {
        Self {
            size,
            content: PageContent::Image(source),
            overlay: None,
        }
    }

    pub fn with_overlay(mut self, overlay: OverlayText) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

/// Ordered instructions for one output document, plus its output file name
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    file_name: String,
    instructions: Vec<CompositionInstruction>,
}

impl CompositionPlan {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            instructions: Vec::new(),
        }
    }

    pub fn from_templates(file_name: impl Into<String>, templates: Vec<PageTemplate>) -> Self {
        let mut plan = Self::new(file_name);
        plan.extend(templates.into_iter().map(CompositionInstruction::template));
        plan
    }

    pub fn push(&mut self, instruction: CompositionInstruction) {
        self.instructions.push(instruction);
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn instructions(&self) -> &[CompositionInstruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Extend<CompositionInstruction> for CompositionPlan {
    fn extend<I: IntoIterator<Item = CompositionInstruction>>(&mut self, iter: I) {
        self.instructions.extend(iter);
    }
}
