use crate::constants::{FALLBACK_PAGE_HEIGHT_MM, FALLBACK_PAGE_WIDTH_MM, mm_to_pt, pt_to_mm};
use std::path::PathBuf;
use thiserror::Error;

/// A page box that cannot be turned into usable dimensions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("page has no MediaBox or CropBox")]
    MissingBox,
    #[error("page box is malformed: {0}")]
    Malformed(String),
    #[error("page box is degenerate ({width} x {height})")]
    Degenerate { width: f32, height: f32 },
}

/// A source file that could not be opened as a paged document
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a PDF document: {reason}")]
    NotAPdf { path: PathBuf, reason: String },
    #[error("{path} is password-protected")]
    Encrypted { path: PathBuf },
    #[error("{path} contains no pages")]
    Empty { path: PathBuf },
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// A page import that cannot be satisfied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("page {page} is out of range (document has {page_count} pages)")]
    OutOfRange { page: u32, page_count: u32 },
    #[error("source document has already been released")]
    Released,
}

/// Failure while building an output document from a plan
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("template for page {page} outlived its source document")]
    TemplateExpired { page: u32 },
    #[error("composition plan has no pages")]
    EmptyPlan,
    #[error("cannot read image {path}: {source}")]
    ImageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Failure while serializing a composed document
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Caller-supplied parameters that violate an operation's preconditions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum RecomposeError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RecomposeError>;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height >= width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

impl Orientation {
    pub fn from_dimensions(width: f32, height: f32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Visible dimensions of a page in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
    pub orientation: Orientation,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            orientation: Orientation::from_dimensions(width, height),
        }
    }

    pub fn from_mm(width_mm: f32, height_mm: f32) -> Self {
        Self::new(mm_to_pt(width_mm), mm_to_pt(height_mm))
    }

    /// Size used when a page's own box is unusable
    pub fn fallback() -> Self {
        Self::from_mm(FALLBACK_PAGE_WIDTH_MM, FALLBACK_PAGE_HEIGHT_MM)
    }

    pub fn width_mm(&self) -> f32 {
        pt_to_mm(self.width)
    }

    pub fn height_mm(&self) -> f32 {
        pt_to_mm(self.height)
    }
}
