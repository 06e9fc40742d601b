use pdf_recompose::{CompressionLevel, Operation, PageRange};
use serde::{Deserialize, Serialize};

/// An uploaded file as received from the client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("original_name", &self.original_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A password that never shows up in logs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(pub String);

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Password(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SplitAction {
    /// Consecutive chunks of `pages_per_file` pages
    #[serde(rename_all = "camelCase")]
    ByPages { pages_per_file: u32 },
    /// One file per range; ranges outside the document are skipped
    ByRange { ranges: Vec<PageRange> },
}

/// Requests accepted by the job runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum JobRequest {
    Merge {
        files: Vec<Upload>,
    },
    Split {
        file: Upload,
        action: SplitAction,
    },
    Number {
        file: Upload,
    },
    Compress {
        file: Upload,
        #[serde(default)]
        level: CompressionLevel,
    },
    Protect {
        file: Upload,
        password: Password,
    },
    ImagesToPdf {
        images: Vec<Upload>,
    },
}

impl JobRequest {
    /// Every upload carried by the request
    pub fn uploads(&self) -> Vec<&Upload> {
        match self {
            JobRequest::Merge { files } => files.iter().collect(),
            JobRequest::ImagesToPdf { images } => images.iter().collect(),
            JobRequest::Split { file, .. }
            | JobRequest::Number { file }
            | JobRequest::Compress { file, .. }
            | JobRequest::Protect { file, .. } => vec![file],
        }
    }

    /// The page operation behind a PDF request; `None` for image conversion
    pub fn operation(&self) -> Option<Operation> {
        let operation = match self {
            JobRequest::Merge { .. } => Operation::Merge,
            JobRequest::Split {
                action: SplitAction::ByPages { pages_per_file },
                ..
            } => Operation::SplitByCount {
                pages_per_file: *pages_per_file,
            },
            JobRequest::Split {
                action: SplitAction::ByRange { ranges },
                ..
            } => Operation::SplitByRange {
                ranges: ranges.clone(),
            },
            JobRequest::Number { .. } => Operation::Number,
            JobRequest::Compress { level, .. } => Operation::Compress { level: *level },
            JobRequest::Protect { password, .. } => Operation::Protect {
                password: password.0.clone(),
            },
            JobRequest::ImagesToPdf { .. } => return None,
        };
        Some(operation)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            JobRequest::Merge { .. } => "merge",
            JobRequest::Split { .. } => "split",
            JobRequest::Number { .. } => "number",
            JobRequest::Compress { .. } => "compress",
            JobRequest::Protect { .. } => "protect",
            JobRequest::ImagesToPdf { .. } => "images",
        }
    }
}
