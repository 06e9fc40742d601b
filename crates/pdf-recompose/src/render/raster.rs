//! Image XObjects for raster inputs
//!
//! JPEG files are embedded untouched with `/DCTDecode`. Every other format is
//! decoded and stored as 8-bit RGB, with an alpha soft mask when the source
//! has transparency.

use crate::types::CompositionError;
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// An image embedded in the output document
pub(crate) struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Read, decode and embed the image at `path`
pub(crate) fn image_xobject(output: &mut Document, path: &Path) -> Result<EmbeddedImage, CompositionError> {
    let bytes = std::fs::read(path).map_err(|source| CompositionError::ImageIo {
        path: path.to_owned(),
        source,
    })?;
    let image_err = |source| CompositionError::Image {
        path: path.to_owned(),
        source,
    };

    let format = image::guess_format(&bytes).map_err(image_err)?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(image_err)?;
    let (width, height) = decoded.dimensions();

    let id = if format == ImageFormat::Jpeg {
        embed_jpeg(output, bytes, &decoded)
    } else {
        embed_raster(output, &decoded)?
    };

    Ok(EmbeddedImage { id, width, height })
}

fn image_dict(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

fn embed_jpeg(output: &mut Document, bytes: Vec<u8>, decoded: &DynamicImage) -> ObjectId {
    // the decoder converts CMYK to RGB, so ask for the stored color type
    let stored = JpegDecoder::new(std::io::Cursor::new(&bytes))
        .map(|decoder| decoder.original_color_type())
        .unwrap_or_else(|_| decoded.color().into());
    let color_space = jpeg_color_space(stored);

    let mut dict = image_dict(decoded.width(), decoded.height(), color_space);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    if color_space == b"DeviceCMYK" && has_adobe_marker(&bytes) {
        // Adobe writers store CMYK inverted
        let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec();
        dict.set("Decode", Object::Array(decode));
    }

    let mut stream = Stream::new(dict, bytes);
    stream.allows_compression = false;
    output.add_object(stream)
}

fn jpeg_color_space(color: ExtendedColorType) -> &'static [u8] {
    match color {
        ExtendedColorType::L8 | ExtendedColorType::L16 => b"DeviceGray",
        ExtendedColorType::Cmyk8 => b"DeviceCMYK",
        _ => b"DeviceRGB",
    }
}

/// Whether the JPEG carries an APP14 "Adobe" segment
fn has_adobe_marker(bytes: &[u8]) -> bool {
    bytes
        .windows(9)
        .any(|w| w[0] == 0xFF && w[1] == 0xEE && &w[4..9] == b"Adobe")
}

fn embed_raster(output: &mut Document, decoded: &DynamicImage) -> Result<ObjectId, CompositionError> {
    let (width, height) = decoded.dimensions();
    let mut dict = image_dict(width, height, b"DeviceRGB");

    if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_id = output.add_object(flate_stream(image_dict(width, height, b"DeviceGray"), alpha)?);
        dict.set("SMask", Object::Reference(mask_id));
    }

    let rgb = decoded.to_rgb8().into_raw();
    Ok(output.add_object(flate_stream(dict, rgb)?))
}

fn flate_stream(dict: Dictionary, content: Vec<u8>) -> Result<Stream, CompositionError> {
    let mut stream = Stream::new(dict, content);
    stream.compress()?;
    Ok(stream)
}

/// Whether `bytes` look like one of the accepted raster formats
pub fn is_supported_image(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::Bmp
            | ImageFormat::WebP)
    )
}

/// Pixel dimensions of the image at `path`, without a full decode.
/// The format comes from the file contents, not its extension.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), CompositionError> {
    let io_err = |source| CompositionError::ImageIo {
        path: path.to_owned(),
        source,
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(io_err)?
        .into_dimensions()
        .map_err(|source| CompositionError::Image {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_color_space_follows_stored_type() {
        assert_eq!(jpeg_color_space(ExtendedColorType::L8), b"DeviceGray");
        assert_eq!(jpeg_color_space(ExtendedColorType::Rgb8), b"DeviceRGB");
        assert_eq!(jpeg_color_space(ExtendedColorType::Cmyk8), b"DeviceCMYK");
    }

    #[test]
    fn test_adobe_marker() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xEE, 0x00, 0x0E];
        jpeg.extend_from_slice(b"Adobe\x00\x64");
        assert!(has_adobe_marker(&jpeg));
        assert!(!has_adobe_marker(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']));
    }

    #[test]
    fn test_dimensions_ignore_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        image::RgbImage::new(7, 3)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        assert_eq!(image_dimensions(&path).unwrap(), (7, 3));
    }
}
