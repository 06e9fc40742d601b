//! Opened source documents and the page templates imported from them

use crate::geometry::{self, PageFrame};
use crate::types::{ImportError, OpenError, PageSize};
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// How far into a file the `%PDF-` marker may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct SourceInner {
    pub(crate) id: u64,
    pub(crate) document: Document,
}

/// A parsed, read-only PDF whose pages can be imported as templates.
///
/// Templates hold only a weak link back to the document; once the source is
/// released they can no longer be composed.
pub struct SourceDocument {
    inner: Option<Arc<SourceInner>>,
    path: PathBuf,
    display_name: String,
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("path", &self.path)
            .field("display_name", &self.display_name)
            .field("page_count", &self.page_count())
            .field("released", &self.inner.is_none())
            .finish()
    }
}

impl SourceDocument {
    /// Read and parse the PDF at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref().to_owned();
        let bytes = tokio::fs::read(&path).await.map_err(|source| OpenError::Io {
            path: path.clone(),
            source,
        })?;
        let source = tokio::task::spawn_blocking(move || Self::from_bytes(&bytes, path)).await??;
        Ok(source)
    }

    /// Parse an in-memory PDF. `path` is used for naming and error messages.
    pub fn from_bytes(bytes: &[u8], path: impl Into<PathBuf>) -> Result<Self, OpenError> {
        let path = path.into();
        let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
        if !window.windows(5).any(|w| w == b"%PDF-") {
            return Err(OpenError::NotAPdf {
                path,
                reason: "missing %PDF header".to_string(),
            });
        }

        let document = Document::load_mem(bytes).map_err(|err| OpenError::NotAPdf {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(OpenError::Encrypted { path });
        }

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(OpenError::Empty { path });
        }

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        log::debug!("opened {} ({} pages)", path.display(), page_ids.len());

        Ok(Self {
            inner: Some(Arc::new(SourceInner {
                id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
                document,
            })),
            path,
            display_name,
            page_ids,
        })
    }

    /// Override the name used to derive output file names
    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Import a 1-based page as a reusable template
    pub fn import_page(&self, page: u32) -> Result<PageTemplate, ImportError> {
        let inner = self.inner.as_ref().ok_or(ImportError::Released)?;
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(ImportError::OutOfRange { page, page_count });
        }

        let page_id = self.page_ids[(page - 1) as usize];
        let frame = geometry::resolve_frame_or_fallback(&inner.document, page_id);

        Ok(PageTemplate {
            source: Arc::downgrade(inner),
            page,
            page_id,
            frame,
        })
    }

    /// Import pages `start..=end` (1-based, inclusive)
    pub fn import_range(&self, start: u32, end: u32) -> Result<Vec<PageTemplate>, ImportError> {
        (start..=end).map(|page| self.import_page(page)).collect()
    }

    /// Import every page in order
    pub fn import_all(&self) -> Result<Vec<PageTemplate>, ImportError> {
        self.import_range(1, self.page_count())
    }

    /// Drop the parsed document. Outstanding templates become unusable.
    pub fn release(&mut self) {
        if self.inner.take().is_some() {
            log::debug!("released {}", self.path.display());
        }
    }
}

/// An imported, immutable snapshot of one source page
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: Weak<SourceInner>,
    page: u32,
    page_id: ObjectId,
    frame: PageFrame,
}

impl PageTemplate {
    /// 1-based page number within the source document
    pub fn page_number(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> PageSize {
        self.frame.size()
    }

    pub fn frame(&self) -> &PageFrame {
        &self.frame
    }

    pub(crate) fn page_id(&self) -> ObjectId {
        self.page_id
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<SourceInner>> {
        self.source.upgrade()
    }
}

impl std::fmt::Debug for SourceInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceInner").field("id", &self.id).finish()
    }
}
