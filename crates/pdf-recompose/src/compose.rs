//! The compositor: executes a [`CompositionPlan`] into a new document

use crate::constants::OVERLAY_FONT_RESOURCE;
use crate::encode::{EncodeOptions, encode};
use crate::geometry::fmt_num;
use crate::plan::{CompositionPlan, ImageSource, PageContent};
use crate::render::{
    CopyCache, PageBuilder, add_overlay_font, image_xobject, overlay_ops, template_xobject,
};
use crate::source::SourceInner;
use crate::types::{CompositionError, PageSize, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::sync::Arc;

/// Resource name under which a page's main XObject is registered
const CONTENT_XOBJECT: &str = "P0";

/// Build a new document from `plan`, one output page per instruction.
///
/// Every template is resolved against its source while composing. The
/// sources must stay open until this returns.
pub fn compose(plan: &CompositionPlan) -> std::result::Result<Document, CompositionError> {
    if plan.is_empty() {
        return Err(CompositionError::EmptyPlan);
    }

    let mut output = Document::with_version("1.7");
    let pages_id = output.new_object_id();

    let mut sources: HashMap<u64, Arc<SourceInner>> = HashMap::new();
    let mut caches: HashMap<u64, CopyCache> = HashMap::new();
    let mut forms: HashMap<(u64, ObjectId), ObjectId> = HashMap::new();
    let mut font_id: Option<ObjectId> = None;
    let mut kids = Vec::with_capacity(plan.len());

    for instruction in plan.instructions() {
        let mut page = PageBuilder::default();

        match &instruction.content {
            PageContent::Template(template) => {
                let inner = template.upgrade().ok_or(CompositionError::TemplateExpired {
                    page: template.page_number(),
                })?;
                let source = sources.entry(inner.id).or_insert(inner);

                let key = (source.id, template.page_id());
                let form_id = match forms.get(&key) {
                    Some(id) => *id,
                    None => {
                        let cache = caches.entry(source.id).or_default();
                        let id = template_xobject(
                            &mut output,
                            &source.document,
                            template.page_id(),
                            template.frame(),
                            cache,
                        )?;
                        forms.insert(key, id);
                        id
                    }
                };
                page.draw_xobject(CONTENT_XOBJECT, form_id, &template.frame().placement_ops());
            }
            PageContent::Image(image) => {
                let embedded = image_xobject(&mut output, &image.path)?;
                let placement = image_placement(image, embedded.width, embedded.height, &instruction.size);
                page.draw_xobject(CONTENT_XOBJECT, embedded.id, &placement);
            }
        }

        if let Some(overlay) = &instruction.overlay {
            let id = *font_id.get_or_insert_with(|| add_overlay_font(&mut output));
            page.add_font(OVERLAY_FONT_RESOURCE, id);
            page.push_ops(&overlay_ops(overlay));
        }

        kids.push(Object::Reference(page.finish(&mut output, pages_id, &instruction.size)));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    output.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", Object::Reference(catalog_id));

    log::debug!(
        "composed {} ({} pages from {} sources)",
        plan.file_name(),
        plan.len(),
        sources.len()
    );

    Ok(output)
}

/// Compose `plan` and serialize the result, off the async runtime
pub async fn compose_to_bytes(plan: CompositionPlan, options: EncodeOptions) -> Result<Vec<u8>> {
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let document = compose(&plan)?;
        Ok(encode(document, &options)?)
    })
    .await??;
    Ok(bytes)
}

/// Image space is the unit square; scale it to the page, or fit it inside
/// the page centered with its aspect ratio kept.
fn image_placement(image: &ImageSource, width: u32, height: u32, page: &PageSize) -> String {
    if image.full_bleed || width == 0 || height == 0 {
        return format!("{} 0 0 {} 0 0 cm\n", fmt_num(page.width), fmt_num(page.height));
    }

    let scale = (page.width / width as f32).min(page.height / height as f32);
    let (w, h) = (width as f32 * scale, height as f32 * scale);
    format!(
        "{} 0 0 {} {} {} cm\n",
        fmt_num(w),
        fmt_num(h),
        fmt_num((page.width - w) / 2.0),
        fmt_num((page.height - h) / 2.0)
    )
}
