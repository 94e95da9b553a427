use std::path::Path;

use image::DynamicImage;

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::orientation::Orientation;

use super::exif_orientation::orientation_or_normal;

/// Decodes still images with the `image` crate and applies their EXIF
/// orientation, so detection always sees upright pixels.
///
/// 8-bit RGB, RGBA and grayscale images map straight onto a [`Frame`].
/// Other layouts (16-bit, float, gray+alpha) are rejected.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_from_image(img: DynamicImage) -> Result<Frame, Box<dyn std::error::Error>> {
    let (width, height) = (img.width(), img.height());
    let (data, format) = match img {
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), PixelFormat::Rgb24),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), PixelFormat::Rgba32),
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), PixelFormat::Gray8),
        other => {
            return Err(format!("unsupported pixel layout {:?}", other.color()).into());
        }
    };
    Ok(Frame::new(data, width, height, format, 0))
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes)?;
        let frame = frame_from_image(img)?;

        let orientation = orientation_or_normal(&bytes);
        if orientation != Orientation::Normal {
            let (w, h) = if orientation.swaps_dimensions() {
                (frame.height(), frame.width())
            } else {
                (frame.width(), frame.height())
            };
            log::debug!(
                "{}: applying orientation {orientation:?}, upright size {w}x{h}",
                path.display()
            );
        }
        Ok(orientation.normalize(&frame))
    }
}
