//! PDF rendering modules for recomposition
//!
//! This module handles all PDF-specific operations:
//! - Creating Form XObjects from page templates
//! - Embedding raster images
//! - Drawing overlay text
//! - Assembling output pages

mod page;
mod raster;
mod text;
mod xobject;

pub use raster::{image_dimensions, is_supported_image};
pub use text::text_width;

pub(crate) use page::PageBuilder;
pub(crate) use raster::image_xobject;
pub(crate) use text::{add_overlay_font, overlay_ops};
pub(crate) use xobject::{CopyCache, template_xobject};
