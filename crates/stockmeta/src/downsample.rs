//! Local image downsampling to a fixed pixel budget.
//!
//! Every input is decoded (with its EXIF orientation applied), scaled uniformly so that `width * height` fits the
//! budget, and re-encoded as JPEG. Images already within budget keep their
//! dimensions but are still re-encoded, so the compressed size can be equal
//! to or even larger than the original for small inputs.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageDecoder, ImageReader};
use serde::{Deserialize, Serialize};

use crate::config::schema::{DownsampleConfig, DEFAULT_MAX_PIXELS, DEFAULT_QUALITY};
use crate::error::DownsampleError;

/// MIME type of every downsampled payload.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Output of [`Downsampler::downsample`].
#[derive(Debug, Clone)]
pub struct DownsampledImage {
    pub encoded: Vec<u8>,
    pub original_dimensions: Dimensions,
    pub dimensions: Dimensions,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
}

impl DownsampledImage {
    /// Original minus compressed size. Zero or negative for inputs that were
    /// already small.
    pub fn bytes_saved(&self) -> i64 {
        self.original_size_bytes as i64 - self.compressed_size_bytes as i64
    }
}

/// Stateless downsampler. `Copy` so it can be moved into blocking tasks.
#[derive(Debug, Clone, Copy)]
pub struct Downsampler {
    max_pixels: u64,
    quality: u8,
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS, DEFAULT_QUALITY)
    }
}

impl Downsampler {
    /// `quality` is on a 0-1 scale and is clamped to the encoder's 1-100 range.
    pub fn new(max_pixels: u64, quality: f32) -> Self {
        Self {
            max_pixels: max_pixels.max(1),
            quality: quality_percent(quality),
        }
    }

    pub fn from_config(config: &DownsampleConfig) -> Self {
        Self::new(config.max_pixels, config.quality)
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn downsample(&self, source: &[u8]) -> Result<DownsampledImage, DownsampleError> {
        let _span = tracing::debug_span!("downsample", bytes = source.len()).entered();

        let image = decode(source)?;
        let (width, height) = image.dimensions();
        let original_dimensions = Dimensions::new(width, height);
        let dimensions = target_dimensions(original_dimensions, self.max_pixels);

        let resized = if dimensions == original_dimensions {
            image
        } else {
            image.resize_exact(dimensions.width, dimensions.height, FilterType::Triangle)
        };

        let encoded = encode_jpeg(&resized, self.quality)?;

        tracing::debug!(
            "Downsampled {} -> {} ({} -> {} bytes)",
            original_dimensions,
            dimensions,
            source.len(),
            encoded.len()
        );

        Ok(DownsampledImage {
            original_size_bytes: source.len() as u64,
            compressed_size_bytes: encoded.len() as u64,
            encoded,
            original_dimensions,
            dimensions,
        })
    }
}

/// Computes the output dimensions for a pixel budget.
///
/// Within budget the dimensions are returned unchanged. Otherwise both sides
/// are scaled by `sqrt(max_pixels / (w * h))` and floored, so
/// `w' * h' <= max_pixels` and the aspect ratio is kept up to rounding.
pub fn target_dimensions(original: Dimensions, max_pixels: u64) -> Dimensions {
    let pixels = original.pixels();
    if pixels <= max_pixels {
        return original;
    }

    let scale = (max_pixels as f64 / pixels as f64).sqrt();
    let mut width = ((f64::from(original.width) * scale).floor() as u32).max(1);
    let mut height = ((f64::from(original.height) * scale).floor() as u32).max(1);

    // Floating point error can land a floor one step too high.
    while u64::from(width) * u64::from(height) > max_pixels && (width > 1 || height > 1) {
        if width >= height {
            width -= 1;
        } else {
            height -= 1;
        }
    }

    Dimensions::new(width, height)
}

fn quality_percent(quality: f32) -> u8 {
    if !quality.is_finite() {
        return (DEFAULT_QUALITY * 100.0).round() as u8;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn decode(source: &[u8]) -> Result<DynamicImage, DownsampleError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| DownsampleError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DownsampleError::Decode(
            "unrecognized image format".to_string(),
        ));
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| DownsampleError::Decode(e.to_string()))?;
    // Unreadable EXIF is not fatal; the pixels are still usable.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| DownsampleError::Decode(e.to_string()))?;
    image.apply_orientation(orientation);
    Ok(image)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, DownsampleError> {
    // JPEG carries no alpha channel.
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| DownsampleError::Encode(e.to_string()))?;
    Ok(buffer)
}
