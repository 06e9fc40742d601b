//! Overlay text: font resources and text-drawing operators

use crate::constants::{
    HELVETICA_BOLD_CAP_HEIGHT, OVERLAY_BASE_FONT, OVERLAY_FONT_RESOURCE, PAGE_NUMBER_FONT_SIZE,
};
use crate::geometry::fmt_num;
use crate::plan::{Alignment, OverlayText};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Add the overlay font to the output document
pub(crate) fn add_overlay_font(output: &mut Document) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(OVERLAY_BASE_FONT.as_bytes().to_vec()));
    font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    output.add_object(font_dict)
}

/// Content-stream operators drawing `overlay` in black
pub(crate) fn overlay_ops(overlay: &OverlayText) -> String {
    let size = PAGE_NUMBER_FONT_SIZE;
    let width = text_width(&overlay.text, size);
    let (anchor_x, anchor_y) = overlay.anchor;

    let x = match overlay.alignment {
        Alignment::TopRight => anchor_x - width,
        Alignment::TopLeft => anchor_x,
    };
    let baseline = anchor_y - size * HELVETICA_BOLD_CAP_HEIGHT;

    format!(
        "q 0 g BT /{} {} Tf {} {} Td ({}) Tj ET Q\n",
        OVERLAY_FONT_RESOURCE,
        fmt_num(size),
        fmt_num(x),
        fmt_num(baseline),
        escape_text(&overlay.text)
    )
}

/// Rendered width of `text` in Helvetica-Bold at `size` points
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(glyph_width).sum();
    units as f32 * size / 1000.0
}

/// Helvetica-Bold advance widths (1/1000 em) for the characters overlays use
fn glyph_width(c: char) -> u32 {
    match c {
        ' ' => 278,
        '0'..='9' => 556,
        'P' => 667,
        'a' => 556,
        'g' => 611,
        'e' => 556,
        '/' => 278,
        '-' => 333,
        _ => 556,
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_label_width() {
        // P(667) a(556) g(611) e(556) space(278) 1(556)
        let width = text_width("Page 1", 1000.0);
        assert_eq!(width, 3224.0);
    }

    #[test]
    fn test_right_aligned_text_ends_at_anchor() {
        let overlay = OverlayText {
            text: "Page 10".to_string(),
            anchor: (500.0, 800.0),
            alignment: Alignment::TopRight,
        };
        let ops = overlay_ops(&overlay);
        let expected_x = 500.0 - text_width("Page 10", PAGE_NUMBER_FONT_SIZE);
        assert!(ops.contains(&format!("{} ", fmt_num(expected_x))));
        assert!(ops.contains("(Page 10) Tj"));
        assert!(ops.starts_with("q 0 g BT /F1 12 Tf"));
    }

    #[test]
    fn test_left_aligned_text_starts_at_anchor() {
        let overlay = OverlayText {
            text: "x".to_string(),
            anchor: (20.0, 100.0),
            alignment: Alignment::TopLeft,
        };
        assert!(overlay_ops(&overlay).contains(" 20 "));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_text("é"), "?");
    }
}
