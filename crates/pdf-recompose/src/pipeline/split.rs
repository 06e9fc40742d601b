use super::Recomposition;
use crate::encode::EncodeOptions;
use crate::plan::CompositionPlan;
use crate::source::SourceDocument;
use crate::types::{Result, ValidationError};

/// A requested page range. Bounds are taken as given and clamped against
/// the document when planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRange {
    pub start: i64,
    pub end: i64,
}

impl PageRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Clamp to `1..=page_count`. `None` when nothing of the range remains.
    pub fn clamp(&self, page_count: u32) -> Option<(u32, u32)> {
        let start = self.start.max(1);
        let end = self.end.min(page_count as i64);
        if start > end {
            return None;
        }
        Some((start as u32, end as u32))
    }
}

impl std::str::FromStr for PageRange {
    type Err = String;

    /// Parses `START-END`, or a single page number
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid page number '{}' in range '{}'", part.trim(), s))
        };
        match s.split_once('-') {
            Some((start, end)) => Ok(PageRange::new(parse(start)?, parse(end)?)),
            None => {
                let page = parse(s)?;
                Ok(PageRange::new(page, page))
            }
        }
    }
}

pub(crate) fn validate_count(pages_per_file: u32) -> std::result::Result<(), ValidationError> {
    if pages_per_file == 0 {
        return Err(ValidationError::new("Pages per file must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_ranges(ranges: &[PageRange]) -> std::result::Result<(), ValidationError> {
    if ranges.is_empty() {
        return Err(ValidationError::new("Please specify at least one page range"));
    }
    Ok(())
}

/// Cut the source into consecutive chunks of `pages_per_file` pages; the
/// last chunk may be shorter.
pub fn split_by_count(source: &SourceDocument, pages_per_file: u32) -> Result<Recomposition> {
    validate_count(pages_per_file)?;

    let page_count = source.page_count();
    let mut plans = Vec::new();
    let mut start = 1;
    while start <= page_count {
        let end = start.saturating_add(pages_per_file - 1).min(page_count);
        let name = format!("page_{}_to_{}.pdf", start, end);
        plans.push(CompositionPlan::from_templates(name, source.import_range(start, end)?));
        start = end + 1;
    }

    log::info!(
        "splitting {} ({} pages) into {} files",
        source.display_name(),
        page_count,
        plans.len()
    );

    Ok(Recomposition {
        plans,
        encoding: EncodeOptions::default(),
        source_pages: page_count,
    })
}

/// One output per range that overlaps the document. Ranges entirely outside
/// it are skipped; this can leave zero outputs.
pub fn split_by_range(source: &SourceDocument, ranges: &[PageRange]) -> Result<Recomposition> {
    validate_ranges(ranges)?;

    let page_count = source.page_count();
    let mut plans = Vec::new();
    for range in ranges {
        let Some((start, end)) = range.clamp(page_count) else {
            log::debug!("range {:?} lies outside 1..={}, skipping", range, page_count);
            continue;
        };
        let name = format!("pages_{}_to_{}.pdf", start, end);
        plans.push(CompositionPlan::from_templates(name, source.import_range(start, end)?));
    }

    Ok(Recomposition {
        plans,
        encoding: EncodeOptions::default(),
        source_pages: page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(PageRange::new(0, 3).clamp(10), Some((1, 3)));
        assert_eq!(PageRange::new(8, 99).clamp(10), Some((8, 10)));
        assert_eq!(PageRange::new(11, 12).clamp(10), None);
        assert_eq!(PageRange::new(5, 2).clamp(10), None);
        assert_eq!(PageRange::new(-4, 0).clamp(10), None);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("2-5".parse::<PageRange>(), Ok(PageRange::new(2, 5)));
        assert_eq!(" 7 ".parse::<PageRange>(), Ok(PageRange::new(7, 7)));
        assert!("a-b".parse::<PageRange>().is_err());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            validate_ranges(&[]).unwrap_err().to_string(),
            "Please specify at least one page range"
        );
        assert!(validate_count(0).is_err());
        assert!(validate_count(1).is_ok());
    }
}
