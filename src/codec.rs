use std::{io::Cursor, path::Path, str::FromStr};

use anyhow::Context;
use image::{
    DynamicImage, ImageEncoder, ImageFormat,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
    },
};

use crate::{
    error::{PosterError, PosterResult},
    surface::Surface,
};

/// Container format remembered from decode and used by default on save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Gif,
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }
}

impl FromStr for ImageKind {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(ImageKind::Gif),
            "jpg" | "jpeg" => Ok(ImageKind::Jpeg),
            "png" => Ok(ImageKind::Png),
            "webp" => Ok(ImageKind::Webp),
            other => Err(PosterError::validation(format!(
                "unsupported image format \"{other}\""
            ))),
        }
    }
}

#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> PosterResult<(Surface, ImageKind)> {
    let format = image::guess_format(bytes).context("detect image format")?;
    let kind = ImageKind::from_format(format).ok_or_else(|| {
        PosterError::validation(format!("unsupported image type {format:?}"))
    })?;
    let dyn_img =
        image::load_from_memory_with_format(bytes, format).context("decode image from memory")?;
    let surface = Surface::from_straight(dyn_img.to_rgba8())?;
    Ok((surface, kind))
}

/// PNG compression level derived from a 0..=100 quality: `min(floor(10 - q/10), 9)`.
pub fn png_level(quality: u8) -> u8 {
    let q = quality.min(100);
    (10 - q / 10).min(9)
}

pub fn encode_image(surface: &Surface, kind: ImageKind, quality: u8) -> PosterResult<Vec<u8>> {
    let quality = quality.min(100);
    let rgba = surface.to_straight();
    let (w, h) = rgba.dimensions();
    let mut buf = Vec::new();

    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel; transparent pixels become black.
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.max(1))
                .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)?;
        }
        ImageKind::Png => {
            let compression = match png_level(quality) {
                0..=2 => CompressionType::Fast,
                3..=6 => CompressionType::Default,
                _ => CompressionType::Best,
            };
            PngEncoder::new_with_quality(&mut buf, compression, FilterType::Adaptive).write_image(
                rgba.as_raw(),
                w,
                h,
                image::ExtendedColorType::Rgba8,
            )?;
        }
        ImageKind::Gif => {
            DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)?;
        }
        ImageKind::Webp => {
            // the bundled WebP encoder is lossless only, quality does not apply
            DynamicImage::ImageRgba8(rgba)
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Surface {
        let raw = vec![100, 50, 200, 128, 0, 255, 0, 255];
        let img = image::RgbaImage::from_raw(2, 1, raw).unwrap();
        Surface::from_straight(img).unwrap()
    }

    #[test]
    fn png_roundtrip_keeps_dimensions_and_tag() {
        let bytes = encode_image(&sample(), ImageKind::Png, 90).unwrap();
        let (decoded, kind) = decode_image(&bytes).unwrap();
        assert_eq!(kind, ImageKind::Png);
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
        assert_eq!(decoded.pixel(1, 0), Some([0, 255, 0, 255]));
    }

    #[test]
    fn jpeg_encode_is_detected_as_jpeg() {
        let bytes = encode_image(&sample(), ImageKind::Jpeg, 80).unwrap();
        let (_, kind) = decode_image(&bytes).unwrap();
        assert_eq!(kind, ImageKind::Jpeg);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn kind_from_extension() {
        let kind = |p: &str| ImageKind::from_path(Path::new(p));
        assert_eq!(kind("a/b.JPG"), Some(ImageKind::Jpeg));
        assert_eq!(kind("b.webp"), Some(ImageKind::Webp));
        assert_eq!(ImageKind::from_path(Path::new("b.tiff")), None);
        assert_eq!(ImageKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn png_level_matches_quality_mapping() {
        assert_eq!(png_level(90), 1);
        assert_eq!(png_level(100), 0);
        assert_eq!(png_level(0), 9);
        assert_eq!(png_level(55), 5);
    }
}
