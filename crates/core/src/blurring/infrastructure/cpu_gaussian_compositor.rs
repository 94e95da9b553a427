use crate::blurring::domain::blur_compositor::{check_mask_size, BlurCompositor, BlurError};
use crate::blurring::domain::occlusion_mask::{MaskBounds, OcclusionMask, MASK_CLEAR, MASK_OPAQUE};
use crate::shared::frame::Frame;

use super::gaussian::{self, RoiRect};

/// CPU compositor using a separable Gaussian blur.
///
/// Only the mask's bounding box (grown by the kernel half-width) is blurred.
/// Every composited pixel sees exactly the neighbourhood it would see in a
/// whole-frame blur, so the result matches blurring the full image and
/// pasting it through the mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuGaussianCompositor;

impl CpuGaussianCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl BlurCompositor for CpuGaussianCompositor {
    fn apply_blur(
        &self,
        frame: &Frame,
        mask: &OcclusionMask,
        radius: f32,
    ) -> Result<Frame, BlurError> {
        check_mask_size(frame, mask)?;

        let mut output = frame.clone();
        let Some(bounds) = mask.bounds() else {
            return Ok(output);
        };

        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        let channels = frame.channels();

        let kernel = gaussian::gaussian_kernel_1d(radius);
        let core = RoiRect {
            x: bounds.x,
            y: bounds.y,
            w: bounds.w,
            h: bounds.h,
        };
        let rect = gaussian::expand_roi(core, kernel.len() / 2, fw, fh);

        let mut roi = Vec::new();
        let mut temp = Vec::new();
        gaussian::extract_roi(frame.data(), fw, channels, rect, &mut roi);
        gaussian::separable_gaussian_blur_with_kernel(
            &mut roi, rect.w, rect.h, channels, &kernel, &mut temp,
        );

        composite_masked(output.data_mut(), &roi, mask, fw, channels, rect, bounds);
        Ok(output)
    }
}

/// Write blurred ROI pixels back into the frame, weighted by mask coverage.
fn composite_masked(
    data: &mut [u8],
    roi: &[u8],
    mask: &OcclusionMask,
    frame_width: usize,
    channels: usize,
    rect: RoiRect,
    bounds: MaskBounds,
) {
    let mask_data = mask.data();
    for y in bounds.y..bounds.y + bounds.h {
        for x in bounds.x..bounds.x + bounds.w {
            let coverage = mask_data[y * frame_width + x];
            if coverage == MASK_CLEAR {
                continue;
            }
            let frame_offset = (y * frame_width + x) * channels;
            let roi_offset = ((y - rect.y) * rect.w + (x - rect.x)) * channels;
            let dst = &mut data[frame_offset..frame_offset + channels];
            let src = &roi[roi_offset..roi_offset + channels];

            if coverage == MASK_OPAQUE {
                dst.copy_from_slice(src);
            } else {
                let alpha = coverage as f32 / 255.0;
                for (d, &s) in dst.iter_mut().zip(src) {
                    let mixed = *d as f32 + (s as f32 - *d as f32) * alpha;
                    *d = mixed.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use crate::shared::plate_region::PlateRegion;

    /// Deterministic high-contrast test pattern.
    fn checkerboard(width: u32, height: u32, format: PixelFormat) -> Frame {
        let channels = format.channels();
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);
        for y in 0..height {
            for x in 0..width {
                let v: u8 = if (x / 3 + y / 3) % 2 == 0 { 230 } else { 20 };
                for c in 0..channels {
                    data.push(v.saturating_sub(c as u8 * 40));
                }
            }
        }
        Frame::new(data, width, height, format, 0)
    }

    fn full_blur(frame: &Frame, radius: f32) -> Vec<u8> {
        let mut data = frame.data().to_vec();
        gaussian::separable_gaussian_blur(
            &mut data,
            frame.width() as usize,
            frame.height() as usize,
            frame.channels(),
            radius,
        );
        data
    }

    #[test]
    fn test_clear_mask_returns_identical_frame() {
        let frame = checkerboard(40, 30, PixelFormat::Rgb24);
        let mask = OcclusionMask::empty(40, 30);
        let out = CpuGaussianCompositor::new()
            .apply_blur(&frame, &mask, 4.0)
            .unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_opaque_mask_matches_full_frame_blur() {
        for format in [PixelFormat::Rgb24, PixelFormat::Rgba32, PixelFormat::Gray8] {
            let frame = checkerboard(33, 21, format);
            let mask = OcclusionMask::filled(33, 21, MASK_OPAQUE);
            let out = CpuGaussianCompositor::new()
                .apply_blur(&frame, &mask, 2.5)
                .unwrap();
            assert_eq!(out.data(), &full_blur(&frame, 2.5)[..], "format {format:?}");
        }
    }

    #[test]
    fn test_partial_mask_matches_full_blur_inside_and_original_outside() {
        let frame = checkerboard(80, 60, PixelFormat::Rgb24);
        let region =
            PlateRegion::from_flat(&[20.0, 15.0, 55.0, 18.0, 52.0, 35.0, 22.0, 31.0]).unwrap();
        let mask = OcclusionMask::from_regions(80, 60, &[region]);
        let blurred = full_blur(&frame, 3.0);

        let out = CpuGaussianCompositor::new()
            .apply_blur(&frame, &mask, 3.0)
            .unwrap();

        for y in 0..60u32 {
            for x in 0..80u32 {
                let i = (y as usize * 80 + x as usize) * 3;
                let expected = if mask.get(x, y) == MASK_OPAQUE {
                    &blurred[i..i + 3]
                } else {
                    &frame.data()[i..i + 3]
                };
                assert_eq!(&out.data()[i..i + 3], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_input_frame_is_not_modified() {
        let frame = checkerboard(20, 20, PixelFormat::Gray8);
        let before = frame.clone();
        let mask = OcclusionMask::filled(20, 20, MASK_OPAQUE);
        let _ = CpuGaussianCompositor::new().apply_blur(&frame, &mask, 2.0);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_fractional_mask_mixes_original_and_blur() {
        let frame = checkerboard(12, 12, PixelFormat::Gray8);
        let blurred = full_blur(&frame, 2.0);
        let mask = OcclusionMask::filled(12, 12, 128);

        let out = CpuGaussianCompositor::new()
            .apply_blur(&frame, &mask, 2.0)
            .unwrap();

        for ((&o, &b), &m) in frame.data().iter().zip(&blurred).zip(out.data()) {
            let (lo, hi) = if o < b { (o, b) } else { (b, o) };
            assert!(lo <= m && m <= hi);
        }
    }

    #[test]
    fn test_dimensions_preserved() {
        let frame = checkerboard(17, 9, PixelFormat::Rgba32);
        let mask = OcclusionMask::filled(17, 9, MASK_OPAQUE);
        let out = CpuGaussianCompositor::new()
            .apply_blur(&frame, &mask, 6.0)
            .unwrap();
        assert_eq!((out.width(), out.height()), (17, 9));
        assert_eq!(out.format(), PixelFormat::Rgba32);
    }

    #[test]
    fn test_mask_size_mismatch_is_error() {
        let frame = checkerboard(10, 10, PixelFormat::Gray8);
        let mask = OcclusionMask::empty(10, 11);
        let err = CpuGaussianCompositor::new()
            .apply_blur(&frame, &mask, 2.0)
            .unwrap_err();
        assert!(matches!(err, BlurError::SizeMismatch { .. }));
    }

    #[test]
    fn test_larger_radius_blurs_more() {
        let frame = checkerboard(40, 40, PixelFormat::Gray8);
        let mask = OcclusionMask::filled(40, 40, MASK_OPAQUE);
        let compositor = CpuGaussianCompositor::new();
        let spread = |f: &Frame| {
            let (min, max) = f
                .data()
                .iter()
                .fold((255u8, 0u8), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            max - min
        };
        let light = compositor.apply_blur(&frame, &mask, 1.0).unwrap();
        let heavy = compositor.apply_blur(&frame, &mask, 6.0).unwrap();
        assert!(spread(&heavy) < spread(&light));
    }
}
