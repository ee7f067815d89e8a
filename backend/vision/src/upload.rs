//! Upload decoding: any raster format the `image` crate understands,
//! normalized to an RGB PNG that is both stored and fed to OCR.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use robowarehouse_core::WarehouseError;
use tracing::debug;

/// An uploaded image after RGB conversion and PNG re-encoding.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode raw upload bytes and normalize them.
///
/// Anything that does not decode as an image yields [`WarehouseError::InvalidImage`].
pub fn decode_upload(bytes: &[u8]) -> Result<NormalizedImage, WarehouseError> {
    if bytes.is_empty() {
        return Err(WarehouseError::InvalidImage("empty upload".into()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| WarehouseError::InvalidImage(e.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut png_bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| WarehouseError::InvalidImage(format!("re-encode failed: {e}")))?;

    debug!(width, height, size = png_bytes.len(), "Normalized upload to PNG");
    Ok(NormalizedImage {
        png_bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn jpeg_fixture() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([200, 10, 10]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .unwrap();
        out
    }

    #[test]
    fn decodes_jpeg_into_png() {
        let normalized = decode_upload(&jpeg_fixture()).unwrap();
        assert_eq!((normalized.width, normalized.height), (6, 4));
        assert_eq!(
            image::guess_format(&normalized.png_bytes).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn drops_alpha_channel() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 128]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();

        let normalized = decode_upload(&out).unwrap();
        let reloaded = image::load_from_memory(&normalized.png_bytes).unwrap();
        assert!(matches!(reloaded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_upload(b"definitely not a picture").unwrap_err();
        assert!(matches!(err, WarehouseError::InvalidImage(_)));
    }

    #[test]
    fn rejects_empty_upload() {
        assert!(matches!(
            decode_upload(&[]),
            Err(WarehouseError::InvalidImage(_))
        ));
    }
}
