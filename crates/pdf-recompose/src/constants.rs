//! Shared constants for page recomposition
//!
//! This module centralizes magic numbers and constants used throughout
//! the recomposition process.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Fallback Page Dimensions
// =============================================================================

/// A4 width in millimeters, used when a page box cannot be resolved
pub const FALLBACK_PAGE_WIDTH_MM: f32 = 210.0;

/// A4 height in millimeters
pub const FALLBACK_PAGE_HEIGHT_MM: f32 = 297.0;

// =============================================================================
// Page Numbers
// =============================================================================

/// Font size of the page-number overlay (points)
pub const PAGE_NUMBER_FONT_SIZE: f32 = 12.0;

/// Inset of the page-number anchor from the top and right page edges (mm)
pub const PAGE_NUMBER_INSET_MM: f32 = 5.0;

/// Label prefix written in front of the 1-based page number
pub const PAGE_NUMBER_LABEL: &str = "Page";

/// Resource name of the overlay font inside each page's /Font dictionary
pub const OVERLAY_FONT_RESOURCE: &str = "F1";

/// Base font used for overlays (one of the standard 14 fonts)
pub const OVERLAY_BASE_FONT: &str = "Helvetica-Bold";

/// Cap height of Helvetica-Bold as a fraction of the font size.
/// Used to drop the baseline below a top-aligned anchor.
pub const HELVETICA_BOLD_CAP_HEIGHT: f32 = 0.718;

// =============================================================================
// Images
// =============================================================================

/// JPEG quality used when re-encoding downsampled images
pub const RESAMPLE_JPEG_QUALITY: u8 = 75;

/// Image scale factor for the medium compression level
pub const MEDIUM_IMAGE_SCALE: f32 = 0.75;

/// Image scale factor for the high compression level
pub const HIGH_IMAGE_SCALE: f32 = 0.5;

// =============================================================================
// Encryption
// =============================================================================

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LEN: usize = 6;

/// RC4 key length used for protected documents (bits)
pub const ENCRYPTION_KEY_BITS: usize = 128;
