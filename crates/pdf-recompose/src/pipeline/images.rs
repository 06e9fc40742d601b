use super::Recomposition;
use crate::encode::EncodeOptions;
use crate::plan::{CompositionInstruction, CompositionPlan, ImageSource};
use crate::render::image_dimensions;
use crate::types::{PageSize, Result, ValidationError};
use std::path::PathBuf;

/// Output name of an image conversion
pub const CONVERTED_FILE_NAME: &str = "converted_images.pdf";

/// One page per image, sized to the image's pixel dimensions (one pixel per
/// point) and oriented to match.
pub fn images_to_pdf(images: &[PathBuf]) -> Result<Recomposition> {
    if images.is_empty() {
        return Err(ValidationError::new("Please upload at least one image").into());
    }

    let mut plan = CompositionPlan::new(CONVERTED_FILE_NAME);
    for path in images {
        let (width, height) = image_dimensions(path)?;
        let size = PageSize::new(width as f32, height as f32);
        plan.push(CompositionInstruction::image(
            ImageSource {
                path: path.clone(),
                full_bleed: true,
            },
            size,
        ));
    }

    log::info!("converting {} images", images.len());

    Ok(Recomposition::single(
        plan,
        EncodeOptions::default(),
        images.len() as u32,
    ))
}
