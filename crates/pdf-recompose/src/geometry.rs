//! Page box resolution
//!
//! Pages inherit `MediaBox`, `CropBox` and `Rotate` from their ancestors in
//! the page tree. The visible area is the crop box when one is present and
//! usable, else the media box. A quarter-turn `/Rotate` swaps the reported
//! width and height.

use crate::types::{GeometryError, PageSize};
use lopdf::{Document, Object, ObjectId};

/// Guards against malformed page trees whose `/Parent` chain loops
const MAX_TREE_DEPTH: usize = 64;

/// The region of a source page that gets placed on an output page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Visible box in source user space: `[x0, y0, x1, y1]`, normalized
    pub bbox: [f32; 4],
    /// Clockwise display rotation in degrees: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageFrame {
    pub fn unrotated_width(&self) -> f32 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn unrotated_height(&self) -> f32 {
        self.bbox[3] - self.bbox[1]
    }

    /// Dimensions as displayed, after applying `/Rotate`
    pub fn size(&self) -> PageSize {
        let (w, h) = (self.unrotated_width(), self.unrotated_height());
        if self.rotation % 180 == 90 {
            PageSize::new(h, w)
        } else {
            PageSize::new(w, h)
        }
    }

    /// Frame covering a fallback-size page at the origin
    pub fn fallback() -> Self {
        let size = PageSize::fallback();
        Self {
            bbox: [0.0, 0.0, size.width, size.height],
            rotation: 0,
        }
    }

    /// Content-stream operators mapping source user space onto an output
    /// page of this frame's displayed size, with the lower-left corner at
    /// the origin.
    pub(crate) fn placement_ops(&self) -> String {
        let [x0, y0, ..] = self.bbox;
        let (w, h) = (self.unrotated_width(), self.unrotated_height());

        let mut ops = String::new();
        match self.rotation {
            90 => ops.push_str(&format!("0 -1 1 0 0 {} cm\n", fmt_num(w))),
            180 => ops.push_str(&format!("-1 0 0 -1 {} {} cm\n", fmt_num(w), fmt_num(h))),
            270 => ops.push_str(&format!("0 1 -1 0 {} 0 cm\n", fmt_num(h))),
            _ => {}
        }
        if x0 != 0.0 || y0 != 0.0 {
            ops.push_str(&format!("1 0 0 1 {} {} cm\n", fmt_num(-x0), fmt_num(-y0)));
        }
        ops
    }
}

/// Resolve the displayed size of a page
pub fn resolve(doc: &Document, page_id: ObjectId) -> Result<PageSize, GeometryError> {
    resolve_frame(doc, page_id).map(|frame| frame.size())
}

/// Resolve the visible box and rotation of a page
pub fn resolve_frame(doc: &Document, page_id: ObjectId) -> Result<PageFrame, GeometryError> {
    let crop = inherited(doc, page_id, b"CropBox").map(|obj| parse_box(doc, obj));
    let bbox = match crop {
        Some(Ok(bbox)) => bbox,
        Some(Err(err)) => {
            log::debug!("ignoring unusable CropBox on {:?}: {}", page_id, err);
            media_box(doc, page_id)?
        }
        None => media_box(doc, page_id)?,
    };

    Ok(PageFrame {
        bbox,
        rotation: rotation(doc, page_id),
    })
}

/// Like [`resolve_frame`], but substitutes the A4 fallback frame when the
/// page box is missing or degenerate.
pub fn resolve_frame_or_fallback(doc: &Document, page_id: ObjectId) -> PageFrame {
    match resolve_frame(doc, page_id) {
        Ok(frame) => frame,
        Err(err) => {
            log::warn!("page {:?}: {}; using A4 fallback", page_id, err);
            PageFrame::fallback()
        }
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4], GeometryError> {
    let obj = inherited(doc, page_id, b"MediaBox").ok_or(GeometryError::MissingBox)?;
    parse_box(doc, obj)
}

fn rotation(doc: &Document, page_id: ObjectId) -> u16 {
    let degrees = inherited(doc, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);
    match degrees.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

/// Look up a page attribute, walking up the `/Parent` chain and following
/// references.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(obj) = dict.get(key) {
            return Some(deref(doc, obj));
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

pub(crate) fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn parse_box(doc: &Document, obj: &Object) -> Result<[f32; 4], GeometryError> {
    let arr = obj
        .as_array()
        .map_err(|_| GeometryError::Malformed("not an array".to_string()))?;
    if arr.len() != 4 {
        return Err(GeometryError::Malformed(format!(
            "expected 4 numbers, found {}",
            arr.len()
        )));
    }

    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(arr) {
        *slot = extract_number(deref(doc, item))
            .ok_or_else(|| GeometryError::Malformed("non-numeric entry".to_string()))?;
    }

    let [a, b, c, d] = values;
    let bbox = [a.min(c), b.min(d), a.max(c), b.max(d)];
    let (width, height) = (bbox[2] - bbox[0], bbox[3] - bbox[1]);
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(GeometryError::Degenerate { width, height });
    }
    Ok(bbox)
}

pub(crate) fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Format a number for a content stream without exponent notation
pub(crate) fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 && value.abs() < 1.0e9 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, dictionary};

    fn doc_with_page(page: Dictionary, parent: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut page = page;
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(page);
        let mut parent = parent;
        parent.set("Type", Object::Name(b"Pages".to_vec()));
        parent.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        parent.set("Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(parent));
        (doc, page_id)
    }

    fn rect(values: [i64; 4]) -> Object {
        Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
    }

    #[test]
    fn test_media_box_is_inherited_from_parent() {
        let (doc, page_id) = doc_with_page(
            Dictionary::new(),
            dictionary! { "MediaBox" => rect([0, 0, 300, 500]) },
        );
        let size = resolve(&doc, page_id).unwrap();
        assert_eq!((size.width, size.height), (300.0, 500.0));
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let (doc, page_id) = doc_with_page(
            dictionary! {
                "MediaBox" => rect([0, 0, 612, 792]),
                "CropBox" => rect([36, 36, 576, 756]),
            },
            Dictionary::new(),
        );
        let frame = resolve_frame(&doc, page_id).unwrap();
        assert_eq!(frame.bbox, [36.0, 36.0, 576.0, 756.0]);
        assert_eq!(frame.size().width, 540.0);
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let (doc, page_id) = doc_with_page(
            dictionary! { "MediaBox" => rect([0, 0, 612, 792]), "Rotate" => Object::Integer(-90) },
            Dictionary::new(),
        );
        let frame = resolve_frame(&doc, page_id).unwrap();
        assert_eq!(frame.rotation, 270);
        let size = frame.size();
        assert_eq!((size.width, size.height), (792.0, 612.0));
        assert_eq!(size.orientation, crate::Orientation::Landscape);
    }

    #[test]
    fn test_degenerate_box_is_rejected() {
        let (doc, page_id) = doc_with_page(
            dictionary! { "MediaBox" => rect([0, 0, 0, 792]) },
            Dictionary::new(),
        );
        assert!(matches!(
            resolve(&doc, page_id),
            Err(GeometryError::Degenerate { .. })
        ));
        let fallback = resolve_frame_or_fallback(&doc, page_id).size();
        assert!((fallback.width_mm() - 210.0).abs() < 0.01);
        assert!((fallback.height_mm() - 297.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_box() {
        let (doc, page_id) = doc_with_page(Dictionary::new(), Dictionary::new());
        assert_eq!(resolve(&doc, page_id), Err(GeometryError::MissingBox));
    }

    #[test]
    fn test_placement_ops() {
        let frame = PageFrame {
            bbox: [10.0, 20.0, 110.0, 220.0],
            rotation: 90,
        };
        assert_eq!(frame.placement_ops(), "0 -1 1 0 0 100 cm\n1 0 0 1 -10 -20 cm\n");
        assert_eq!(PageFrame::fallback().placement_ops(), "");
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(-3.5), "-3.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.3333");
    }
}
