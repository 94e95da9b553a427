use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::plate_region::{PlateRegion, Point};

/// Draws each region's closed outline onto `frame` in place.
///
/// Visual aid only: it never feeds back into masking or detection.
/// Edges are stamped with a square brush of `stroke_width` pixels.
pub fn draw_outline(frame: &mut Frame, regions: &[PlateRegion], color: [u8; 3], stroke_width: u32) {
    let pixel = pixel_value(frame.format(), color);
    let stroke = stroke_width.max(1) as i64;
    for region in regions {
        if region.points().len() < 2 {
            continue;
        }
        for (a, b) in region.edges() {
            draw_segment(frame, a, b, stroke, &pixel);
        }
    }
}

fn pixel_value(format: PixelFormat, [r, g, b]: [u8; 3]) -> Vec<u8> {
    match format {
        PixelFormat::Rgb24 => vec![r, g, b],
        PixelFormat::Rgba32 => vec![r, g, b, 255],
        PixelFormat::Gray8 => {
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            vec![luma.round().clamp(0.0, 255.0) as u8]
        }
    }
}

fn draw_segment(frame: &mut Frame, a: Point, b: Point, stroke: i64, pixel: &[u8]) {
    // Anything further out than one brush width cannot touch the frame.
    let margin = stroke as f64;
    let Some((a, b)) = clip_segment(
        a,
        b,
        -margin,
        frame.width() as f64 + margin,
        -margin,
        frame.height() as f64 + margin,
    ) else {
        return;
    };

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (a.x + dx * t).floor() as i64;
        let y = (a.y + dy * t).floor() as i64;
        stamp(frame, x, y, stroke, pixel);
    }
}

/// Liang-Barsky clip of segment `a`-`b` to the given box.
fn clip_segment(
    a: Point,
    b: Point,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, a.x - x_min),
        (dx, x_max - a.x),
        (-dy, a.y - y_min),
        (dy, y_max - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        Point::new(a.x + t0 * dx, a.y + t0 * dy),
        Point::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

fn stamp(frame: &mut Frame, cx: i64, cy: i64, stroke: i64, pixel: &[u8]) {
    let w = frame.width() as i64;
    let h = frame.height() as i64;
    let channels = pixel.len();
    let start = -(stroke / 2);
    let data = frame.data_mut();
    for oy in start..start + stroke {
        let y = cy + oy;
        if y < 0 || y >= h {
            continue;
        }
        for ox in start..start + stroke {
            let x = cx + ox;
            if x < 0 || x >= w {
                continue;
            }
            let offset = ((y * w + x) as usize) * channels;
            data[offset..offset + channels].copy_from_slice(pixel);
        }
    }
}
