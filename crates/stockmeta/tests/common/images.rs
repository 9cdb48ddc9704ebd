//! Image fixtures built in memory so tests need no files on disk.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// A gradient that compresses like a photo rather than a flat fill.
pub fn gradient(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 3 + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode fixture");
    bytes
}

/// Uncompressed bitmap, so the re-encoded JPEG is always smaller.
pub fn bmp(width: u32, height: u32) -> Vec<u8> {
    gradient(width, height, ImageFormat::Bmp)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    gradient(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    gradient(width, height, ImageFormat::Jpeg)
}

/// Bytes no decoder accepts.
pub fn corrupt() -> Vec<u8> {
    b"\x00\x01 this is not an image \xff\xfe".to_vec()
}

/// Valid PNG signature followed by garbage.
pub fn truncated_png() -> Vec<u8> {
    let mut bytes = png(64, 64);
    bytes.truncate(48);
    bytes
}
