//! Image re-encoding
//!
//! Uploaded images are fully decoded and re-encoded before storage, which
//! drops every ancillary chunk (EXIF, GPS, text blocks) rather than
//! stripping tags selectively. PNG stays PNG; JPEG and WebP are written
//! back as JPEG.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// The output of a sanitizing re-encode.
#[derive(Debug, Clone)]
pub struct SanitizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mime_type: String,
}

pub struct ImageCodec;

impl ImageCodec {
    pub fn is_image_mime(mime_type: &str) -> bool {
        matches!(mime_type, "image/png" | "image/jpeg" | "image/webp")
    }

    /// Decode and re-encode an image, returning clean bytes plus the
    /// dimensions and format captured along the way.
    pub fn sanitize(data: &[u8]) -> Result<SanitizedImage, anyhow::Error> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let source_format = reader
            .format()
            .ok_or_else(|| anyhow::anyhow!("Unrecognized image format"))?;
        let img = reader.decode()?;
        let (width, height) = img.dimensions();

        let target = match source_format {
            ImageFormat::Png => ImageFormat::Png,
            // JPEG and WebP normalize to JPEG
            _ => ImageFormat::Jpeg,
        };

        let bytes = Self::encode(&img, target)?;

        let (format, mime_type) = match target {
            ImageFormat::Png => ("Png", "image/png"),
            _ => ("Jpeg", "image/jpeg"),
        };

        Ok(SanitizedImage {
            bytes,
            width,
            height,
            format: format.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    fn encode(img: &DynamicImage, target: ImageFormat) -> Result<Vec<u8>, anyhow::Error> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        match target {
            ImageFormat::Png => img.write_to(&mut cursor, ImageFormat::Png)?,
            // JPEG has no alpha channel
            _ => img.to_rgb8().write_to(&mut cursor, ImageFormat::Jpeg)?,
        }
        Ok(buffer)
    }
}
