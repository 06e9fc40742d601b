#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// Build a PDF with one page per entry of `sizes` (width, height in points).
/// Page N draws the text marker `src-N` with a shared Helvetica font.
pub fn create_test_pdf(sizes: &[(i64, i64)]) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 72 72 Td (src-{}) Tj ET", index + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]);
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(*width),
                    Object::Integer(*height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}

/// `count` US Letter pages
pub fn letter_pages(count: usize) -> Document {
    create_test_pdf(&vec![(612, 792); count])
}

pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

pub fn write_pdf(doc: Document, path: &Path) {
    std::fs::write(path, to_bytes(doc)).unwrap();
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Decoded content of the XObject a composed page draws
pub fn placed_content(doc: &Document, page_id: ObjectId) -> Vec<u8> {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let form_id = xobjects.get(b"P0").unwrap().as_reference().unwrap();
    let stream = doc.get_object(form_id).unwrap().as_stream().unwrap();
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().unwrap()
    } else {
        stream.content.clone()
    }
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
