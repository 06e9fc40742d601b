//! Output page assembly

use crate::types::PageSize;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Resources and drawing operators accumulated for one output page
#[derive(Debug, Default)]
pub(crate) struct PageBuilder {
    ops: String,
    xobjects: Dictionary,
    fonts: Dictionary,
}

impl PageBuilder {
    /// Register an XObject and draw it with `placement` applied
    pub(crate) fn draw_xobject(&mut self, name: &str, id: ObjectId, placement: &str) {
        self.xobjects.set(name.as_bytes(), Object::Reference(id));
        self.ops.push_str("q\n");
        self.ops.push_str(placement);
        self.ops.push_str(&format!("/{} Do\nQ\n", name));
    }

    pub(crate) fn add_font(&mut self, name: &str, id: ObjectId) {
        self.fonts.set(name.as_bytes(), Object::Reference(id));
    }

    pub(crate) fn push_ops(&mut self, ops: &str) {
        self.ops.push_str(ops);
    }

    /// Write the page and its content stream into `output`
    pub(crate) fn finish(self, output: &mut Document, parent: ObjectId, size: &PageSize) -> ObjectId {
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(parent));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width),
                Object::Real(size.height),
            ]),
        );

        let mut resources = Dictionary::new();
        if !self.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(self.xobjects));
        }
        if !self.fonts.is_empty() {
            resources.set("Font", Object::Dictionary(self.fonts));
        }

        let content_id = output.add_object(Stream::new(Dictionary::new(), self.ops.into_bytes()));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(resources));

        output.add_object(page_dict)
    }
}
