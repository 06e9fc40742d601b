//! Form XObject creation from imported page templates
//!
//! Each template becomes a Form XObject in the output document. The source
//! page's content and resources are copied, so the output never references
//! the source document.

use crate::geometry::{self, PageFrame};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Maps source object ids to their copies in one output document
pub(crate) type CopyCache = HashMap<ObjectId, ObjectId>;

// =============================================================================
// XObject Creation
// =============================================================================

/// Create a Form XObject holding the content of `page_id`.
///
/// `cache` must be specific to this (source, output) pair so shared
/// resources such as fonts are copied once per output document.
pub(crate) fn template_xobject(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    frame: &PageFrame,
    cache: &mut CopyCache,
) -> lopdf::Result<ObjectId> {
    let page_dict = source.get_dictionary(page_id)?;
    let (mut xobject_dict, content) = page_content(source, page_dict)?;

    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set(
        "BBox",
        Object::Array(frame.bbox.iter().map(|v| Object::Real(*v)).collect()),
    );

    if let Some(resources) = geometry::inherited(source, page_id, b"Resources") {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, resources, cache)?,
        );
    }

    Ok(output.add_object(Stream::new(xobject_dict, content)))
}

// =============================================================================
// Page Content Extraction
// =============================================================================

/// Get the content of a page, plus any stream filter entries that must
/// travel with it.
///
/// A single content stream is copied as-is, still encoded. Content arrays
/// are decoded and joined, since the parts only form valid syntax together.
fn page_content(doc: &Document, page_dict: &Dictionary) -> lopdf::Result<(Dictionary, Vec<u8>)> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => geometry::deref(doc, c),
        Err(_) => return Ok((Dictionary::new(), Vec::new())), // blank page
    };

    match contents {
        Object::Stream(stream) => {
            let mut dict = Dictionary::new();
            for key in [&b"Filter"[..], b"DecodeParms"] {
                if let Ok(value) = stream.dict.get(key) {
                    dict.set(key.to_vec(), value.clone());
                }
            }
            Ok((dict, stream.content.clone()))
        }
        Object::Array(arr) => Ok((Dictionary::new(), concatenated_content(doc, arr)?)),
        _ => Ok((Dictionary::new(), Vec::new())),
    }
}

fn concatenated_content(doc: &Document, parts: &[Object]) -> lopdf::Result<Vec<u8>> {
    let mut result = Vec::new();

    for part in parts {
        if let Ok(stream) = geometry::deref(doc, part).as_stream() {
            result.extend_from_slice(&decoded_content(stream));
            result.push(b'\n');
        }
    }

    Ok(result)
}

fn decoded_content(stream: &Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_err() {
        return stream.content.clone();
    }
    stream.decompressed_content().unwrap_or_else(|err| {
        log::warn!("cannot decode content stream, copying raw bytes: {}", err);
        stream.content.clone()
    })
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from source to output document, following references.
///
/// `/Parent` links are dropped so a resource that points back into the page
/// tree does not drag the whole source tree along. The output id is reserved
/// before recursing, which keeps self-referencing structures finite.
pub(crate) fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut CopyCache,
) -> lopdf::Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let referenced = match source.get_object(*id) {
                Ok(referenced) => referenced,
                Err(_) => return Ok(Object::Null), // dangling reference
            };
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(output, source, dict, cache)?)),
        Object::Array(arr) => {
            let new_arr: lopdf::Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut CopyCache,
) -> lopdf::Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key.as_slice() == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}
