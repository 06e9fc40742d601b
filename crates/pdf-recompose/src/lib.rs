pub mod constants;
mod compose;
mod encode;
pub mod geometry;
pub mod pipeline;
mod plan;
mod render;
mod source;
mod types;

pub use compose::{compose, compose_to_bytes};
pub use encode::{CompressionLevel, EncodeOptions, EncryptionDirective, PermissionSet, encode};
pub use geometry::PageFrame;
pub use pipeline::{Operation, PageRange, Recomposition};
pub use plan::*;
pub use render::{image_dimensions, is_supported_image, text_width};
pub use source::{PageTemplate, SourceDocument};
pub use types::*;
