/// ROI rectangle within a frame, used to pass region coordinates without many arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Kernel half-width for a Gaussian of standard deviation `radius`.
///
/// Covers three standard deviations on each side, which holds all but
/// ~0.3% of the weight.
pub fn kernel_half_width(radius: f32) -> usize {
    (3.0 * radius.max(0.0)).ceil() as usize
}

/// Precompute a normalized 1D Gaussian kernel with `sigma = radius`.
///
/// Returns a single-tap identity kernel for radii too small to matter.
pub fn gaussian_kernel_1d(radius: f32) -> Vec<f32> {
    let half = kernel_half_width(radius);
    if half == 0 {
        return vec![1.0];
    }
    let sigma = radius as f64;
    let mut kernel_f64: Vec<f64> = (0..=2 * half)
        .map(|i| {
            let x = i as f64 - half as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Convenience wrapper that builds the kernel and allocates its own temp buffer.
#[cfg(test)]
pub fn separable_gaussian_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    radius: f32,
) {
    let kernel = gaussian_kernel_1d(radius);
    let mut temp = Vec::new();
    separable_gaussian_blur_with_kernel(data, width, height, channels, &kernel, &mut temp);
}

/// Apply a separable Gaussian blur using a pre-computed kernel, reusing `temp`.
///
/// Samples beyond the buffer edge are clamped to the nearest edge pixel.
pub fn separable_gaussian_blur_with_kernel(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = kernel_size / 2;

    let needed = width * height * channels;
    temp.resize(needed, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half as isize)
                        .max(0)
                        .min((width - 1) as isize) as usize;
                    sum += data[(y * width + sx) * channels + c] as f32 * w;
                }
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - half as isize)
                        .max(0)
                        .min((height - 1) as isize) as usize;
                    sum += temp[(sy * width + x) * channels + c] * w;
                }
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Grows `rect` by `margin` pixels on every side, clipped to the frame.
pub fn expand_roi(rect: RoiRect, margin: usize, frame_width: usize, frame_height: usize) -> RoiRect {
    let x0 = rect.x.saturating_sub(margin);
    let y0 = rect.y.saturating_sub(margin);
    let x1 = (rect.x + rect.w + margin).min(frame_width);
    let y1 = (rect.y + rect.h + margin).min(frame_height);
    RoiRect {
        x: x0,
        y: y0,
        w: x1 - x0,
        h: y1 - y0,
    }
}

/// Extract a rectangular ROI from frame data into a reusable buffer.
pub fn extract_roi(
    data: &[u8],
    frame_width: usize,
    channels: usize,
    rect: RoiRect,
    roi: &mut Vec<u8>,
) {
    roi.resize(rect.w * rect.h * channels, 0);
    for row in 0..rect.h {
        let src_offset = ((rect.y + row) * frame_width + rect.x) * channels;
        let dst_offset = row * rect.w * channels;
        roi[dst_offset..dst_offset + rect.w * channels]
            .copy_from_slice(&data[src_offset..src_offset + rect.w * channels]);
    }
}
