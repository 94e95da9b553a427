use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// JPEG has no alpha channel, so RGBA frames bound for JPEG lose theirs.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn image_from_frame(frame: &Frame) -> Result<DynamicImage, Box<dyn std::error::Error>> {
    let (w, h, data) = (frame.width(), frame.height(), frame.data().to_vec());
    let img = match frame.format() {
        PixelFormat::Rgb24 => image::RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba32 => {
            image::RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8)
        }
        PixelFormat::Gray8 => image::GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
    };
    img.ok_or_else(|| "Failed to create image from frame data".into())
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        // Ensure parent directory exists (infrastructure concern)
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut img = image_from_frame(frame)?;
        if frame.format() == PixelFormat::Rgba32
            && ImageFormat::from_path(path).ok() == Some(ImageFormat::Jpeg)
        {
            img = DynamicImage::ImageRgb8(img.to_rgb8());
        }

        img.save(path)?;
        Ok(())
    }
}
