//! Serialization of composed documents: stream compression, image
//! downsampling and encryption

use crate::constants::{
    ENCRYPTION_KEY_BITS, HIGH_IMAGE_SCALE, MEDIUM_IMAGE_SCALE, RESAMPLE_JPEG_QUALITY,
};
use crate::types::EncodeError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat, Stream};
use std::str::FromStr;

/// How aggressively output size is reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CompressionLevel {
    /// Re-encode without stream compression
    Low,
    /// Compressed streams, images downsampled to 75%
    #[default]
    Medium,
    /// Compressed streams, images downsampled to 50%
    High,
}

impl CompressionLevel {
    pub fn compresses_streams(self) -> bool {
        !matches!(self, CompressionLevel::Low)
    }

    pub fn image_scale(self) -> f32 {
        match self {
            CompressionLevel::Low => 1.0,
            CompressionLevel::Medium => MEDIUM_IMAGE_SCALE,
            CompressionLevel::High => HIGH_IMAGE_SCALE,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(format!("unknown compression level '{}'", other)),
        }
    }
}

/// Operations a reader may perform on a protected document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet {
    pub print: bool,
    pub modify: bool,
    pub copy: bool,
    pub annotate: bool,
}

impl PermissionSet {
    fn to_permissions(self) -> Permissions {
        let mut permissions = Permissions::empty();
        if self.print {
            permissions |= Permissions::PRINTABLE;
        }
        if self.modify {
            permissions |= Permissions::MODIFIABLE;
        }
        if self.copy {
            permissions |= Permissions::COPYABLE;
        }
        if self.annotate {
            permissions |= Permissions::ANNOTABLE;
        }
        permissions
    }
}

/// Passwords and permissions for a protected output
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionDirective {
    pub user_password: String,
    pub owner_password: String,
    pub permissions: PermissionSet,
}

impl EncryptionDirective {
    /// One password to open, nothing permitted once open
    pub fn deny_all(password: &str) -> Self {
        Self {
            user_password: password.to_string(),
            owner_password: password.to_string(),
            permissions: PermissionSet::default(),
        }
    }
}

impl std::fmt::Debug for EncryptionDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionDirective")
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Knobs applied when a composed document is written out
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub compress_streams: bool,
    /// Factor applied to embedded image dimensions; 1.0 leaves images alone
    pub image_scale: f32,
    pub encryption: Option<EncryptionDirective>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compress_streams: true,
            image_scale: 1.0,
            encryption: None,
        }
    }
}

impl EncodeOptions {
    pub fn for_level(level: CompressionLevel) -> Self {
        Self {
            compress_streams: level.compresses_streams(),
            image_scale: level.image_scale(),
            encryption: None,
        }
    }

    pub fn encrypted(directive: EncryptionDirective) -> Self {
        Self {
            encryption: Some(directive),
            ..Self::default()
        }
    }
}

/// Serialize `document`, applying downsampling, compression and encryption
/// in that order.
pub fn encode(mut document: Document, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    if options.image_scale < 1.0 {
        let rescaled = rescale_images(&mut document, options.image_scale);
        log::info!(
            "downsampled {} images to {:.0}%",
            rescaled,
            options.image_scale * 100.0
        );
    }

    if options.compress_streams {
        document.compress();
    }

    if let Some(directive) = &options.encryption {
        encrypt(&mut document, directive)?;
    }

    let mut writer = Vec::new();
    document.save_to(&mut writer)?;
    Ok(writer)
}

// =============================================================================
// Encryption
// =============================================================================

fn encrypt(document: &mut Document, directive: &EncryptionDirective) -> Result<(), EncodeError> {
    ensure_file_id(document);

    let version = EncryptionVersion::V2 {
        document: &*document,
        owner_password: &directive.owner_password,
        user_password: &directive.user_password,
        key_length: ENCRYPTION_KEY_BITS,
        permissions: directive.permissions.to_permissions(),
    };
    let state =
        EncryptionState::try_from(version).map_err(|e| EncodeError::Encryption(e.to_string()))?;
    document
        .encrypt(&state)
        .map_err(|e| EncodeError::Encryption(e.to_string()))?;
    Ok(())
}

/// Standard security handlers derive the key from the first `/ID` entry
fn ensure_file_id(document: &mut Document) {
    if document.trailer.get(b"ID").is_ok() {
        return;
    }
    let id = uuid::Uuid::new_v4().as_bytes().to_vec();
    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}

// =============================================================================
// Image Downsampling
// =============================================================================

/// Downsample every image XObject the codec stack understands. Images in
/// other encodings are left as they are.
fn rescale_images(document: &mut Document, scale: f32) -> usize {
    let mut rescaled = 0;
    for (id, object) in document.objects.iter_mut() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_image(stream) {
            continue;
        }
        match rescale_image(stream, scale) {
            Ok(true) => rescaled += 1,
            Ok(false) => log::debug!("image {:?} left at original resolution", id),
            Err(err) => log::warn!("cannot downsample image {:?}: {}", id, err),
        }
    }
    rescaled
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(|s| s.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Channels {
    Gray,
    Rgb,
}

fn rescale_image(stream: &mut Stream, scale: f32) -> Result<bool, Box<dyn std::error::Error>> {
    let dict = &stream.dict;
    if dict.get(b"ImageMask").and_then(|o| o.as_bool()).unwrap_or(false)
        || dict.get(b"DecodeParms").is_ok()
        || dict.get(b"Decode").is_ok()
    {
        return Ok(false);
    }

    let channels = match dict.get(b"ColorSpace").and_then(|o| o.as_name()) {
        Ok(b"DeviceGray") => Channels::Gray,
        Ok(b"DeviceRGB") => Channels::Rgb,
        _ => return Ok(false),
    };
    let bits = dict.get(b"BitsPerComponent").and_then(|o| o.as_i64()).unwrap_or(8);
    let width = dict.get(b"Width")?.as_i64()? as u32;
    let height = dict.get(b"Height")?.as_i64()? as u32;

    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    if new_width >= width && new_height >= height {
        return Ok(false);
    }

    let filter = match dict.get(b"Filter") {
        Ok(Object::Name(name)) => Some(name.clone()),
        Ok(Object::Array(arr)) if arr.len() == 1 => arr[0].as_name().ok().map(|n| n.to_vec()),
        Ok(_) => return Ok(false),
        Err(_) => None,
    };

    match filter.as_deref() {
        Some(b"DCTDecode") => {
            let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?;
            let resized = decoded.resize_exact(new_width, new_height, FilterType::Triangle);
            let resized = match channels {
                Channels::Gray => DynamicImage::ImageLuma8(resized.to_luma8()),
                Channels::Rgb => DynamicImage::ImageRgb8(resized.to_rgb8()),
            };
            let mut jpeg = Vec::new();
            resized.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, RESAMPLE_JPEG_QUALITY))?;
            stream.set_content(jpeg);
        }
        None | Some(b"FlateDecode") if bits == 8 => {
            let raw = if filter.is_some() {
                stream.decompressed_content()?
            } else {
                stream.content.clone()
            };
            let resized = match channels {
                Channels::Gray => {
                    let img = GrayImage::from_raw(width, height, raw).ok_or("pixel data is truncated")?;
                    DynamicImage::ImageLuma8(img).resize_exact(new_width, new_height, FilterType::Triangle)
                }
                Channels::Rgb => {
                    let img = RgbImage::from_raw(width, height, raw).ok_or("pixel data is truncated")?;
                    DynamicImage::ImageRgb8(img).resize_exact(new_width, new_height, FilterType::Triangle)
                }
            };
            stream.dict.remove(b"Filter");
            stream.set_content(resized.into_bytes());
            stream.compress()?;
        }
        _ => return Ok(false),
    }

    stream.dict.set("Width", Object::Integer(new_width as i64));
    stream.dict.set("Height", Object::Integer(new_height as i64));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_levels() {
        assert!(!CompressionLevel::Low.compresses_streams());
        assert_eq!(CompressionLevel::Low.image_scale(), 1.0);
        assert_eq!(CompressionLevel::Medium.image_scale(), 0.75);
        assert_eq!(CompressionLevel::High.image_scale(), 0.5);
        assert_eq!(CompressionLevel::default(), CompressionLevel::Medium);
    }

    #[test]
    fn test_compression_level_from_str() {
        assert_eq!("HIGH".parse::<CompressionLevel>(), Ok(CompressionLevel::High));
        assert!("extreme".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_directive_debug_hides_passwords() {
        let directive = EncryptionDirective::deny_all("hunter22");
        assert!(!format!("{:?}", directive).contains("hunter22"));
    }

    #[test]
    fn test_raw_rgb_image_is_downsampled() {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(4));
        dict.set("Height", Object::Integer(4));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        let mut stream = Stream::new(dict, vec![200u8; 4 * 4 * 3]);

        assert!(rescale_image(&mut stream, 0.5).unwrap());
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 2);
        assert_eq!(stream.decompressed_content().unwrap().len(), 2 * 2 * 3);
    }

    #[test]
    fn test_unknown_color_space_is_skipped() {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(4));
        dict.set("Height", Object::Integer(4));
        dict.set("ColorSpace", Object::Name(b"DeviceCMYK".to_vec()));
        let mut stream = Stream::new(dict, vec![0u8; 64]);
        assert!(!rescale_image(&mut stream, 0.5).unwrap());
    }
}
