//! Operation strategies
//!
//! Each strategy turns one or more opened sources into composition plans
//! plus the encoding applied when the plans are written out. Strategies only
//! import templates; composing and encoding happens afterwards, which lets
//! callers delete source files as soon as planning returns.

mod compress;
mod images;
mod merge;
mod numbering;
mod protect;
mod split;

pub use compress::compress;
pub use images::images_to_pdf;
pub use merge::merge;
pub use numbering::number_pages;
pub use protect::protect;
pub use split::{PageRange, split_by_count, split_by_range};

use crate::encode::{CompressionLevel, EncodeOptions};
use crate::plan::CompositionPlan;
use crate::source::SourceDocument;
use crate::types::{Result, ValidationError};

/// Output of a strategy: zero or more plans sharing one encoding
#[derive(Debug, Clone)]
pub struct Recomposition {
    pub plans: Vec<CompositionPlan>,
    pub encoding: EncodeOptions,
    /// Total pages across the inputs that were planned from
    pub source_pages: u32,
}

impl Recomposition {
    pub(crate) fn single(plan: CompositionPlan, encoding: EncodeOptions, source_pages: u32) -> Self {
        Self {
            plans: vec![plan],
            encoding,
            source_pages,
        }
    }
}

/// A page operation over opened PDF sources
#[derive(Clone, PartialEq)]
pub enum Operation {
    Merge,
    SplitByCount { pages_per_file: u32 },
    SplitByRange { ranges: Vec<PageRange> },
    Number,
    Compress { level: CompressionLevel },
    Protect { password: String },
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Merge => write!(f, "Merge"),
            Operation::SplitByCount { pages_per_file } => {
                write!(f, "SplitByCount({})", pages_per_file)
            }
            Operation::SplitByRange { ranges } => write!(f, "SplitByRange({:?})", ranges),
            Operation::Number => write!(f, "Number"),
            Operation::Compress { level } => write!(f, "Compress({:?})", level),
            Operation::Protect { .. } => write!(f, "Protect"),
        }
    }
}

impl Operation {
    /// Check caller-supplied parameters without touching any document
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match self {
            Operation::SplitByCount { pages_per_file } => split::validate_count(*pages_per_file),
            Operation::SplitByRange { ranges } => split::validate_ranges(ranges),
            Operation::Protect { password } => protect::validate_password(password),
            _ => Ok(()),
        }
    }

    /// Plan this operation over `sources`
    pub fn plan(&self, sources: &[SourceDocument]) -> Result<Recomposition> {
        self.validate()?;

        match self {
            Operation::Merge => merge(sources),
            Operation::SplitByCount { pages_per_file } => {
                split_by_count(self.single_source(sources)?, *pages_per_file)
            }
            Operation::SplitByRange { ranges } => {
                split_by_range(self.single_source(sources)?, ranges)
            }
            Operation::Number => number_pages(self.single_source(sources)?),
            Operation::Compress { level } => compress(self.single_source(sources)?, *level),
            Operation::Protect { password } => protect(self.single_source(sources)?, password),
        }
    }

    fn single_source<'a>(
        &self,
        sources: &'a [SourceDocument],
    ) -> std::result::Result<&'a SourceDocument, ValidationError> {
        match sources {
            [source] => Ok(source),
            _ => Err(ValidationError::new(format!(
                "{:?} takes exactly one document, got {}",
                self,
                sources.len()
            ))),
        }
    }
}

/// Output file name built from a prefix and the source's display name
pub(crate) fn derived_name(prefix: &str, source: &SourceDocument) -> String {
    format!("{}_{}", prefix, source.display_name())
}
