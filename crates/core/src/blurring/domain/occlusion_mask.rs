use crate::shared::plate_region::PlateRegion;

pub const MASK_CLEAR: u8 = 0;
pub const MASK_OPAQUE: u8 = 255;

/// Per-pixel blur coverage for one frame: 0 keeps the original pixel,
/// 255 takes the blurred one, anything between mixes the two.
#[derive(Clone, Debug, PartialEq)]
pub struct OcclusionMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Pixel rectangle covering every non-zero mask value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskBounds {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl OcclusionMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self::filled(width, height, MASK_CLEAR)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Rasterizes `regions` into a fresh mask.
    ///
    /// Polygons are filled solid with the even-odd rule, sampling each pixel
    /// at its centre `(x + 0.5, y + 0.5)`. Parts outside the canvas are
    /// clipped. Degenerate outlines are skipped.
    pub fn from_regions(width: u32, height: u32, regions: &[PlateRegion]) -> Self {
        let mut mask = Self::empty(width, height);
        for region in regions {
            if region.is_degenerate() {
                log::debug!("Skipping degenerate plate outline: {:?}", region.points());
                continue;
            }
            mask.fill_polygon(region);
        }
        mask
    }

    fn fill_polygon(&mut self, region: &PlateRegion) {
        let Some((_, min_y, _, max_y)) = region.bounding_box() else {
            return;
        };
        let w = self.width as usize;
        let row_start = (min_y.floor().max(0.0) as usize).min(self.height as usize);
        let row_end = (max_y.ceil().max(0.0) as usize).min(self.height as usize);

        let mut crossings: Vec<f64> = Vec::with_capacity(region.points().len());
        for row in row_start..row_end {
            let sample_y = row as f64 + 0.5;
            crossings.clear();
            for (a, b) in region.edges() {
                if (a.y > sample_y) != (b.y > sample_y) {
                    crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                // Pixel x is inside when span[0] <= x + 0.5 < span[1].
                let start = (span[0] - 0.5).ceil().clamp(0.0, w as f64) as usize;
                let end = (span[1] - 0.5).ceil().clamp(0.0, w as f64) as usize;
                if start < end {
                    self.data[row * w + start..row * w + end].fill(MASK_OPAQUE);
                }
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// True when no pixel would receive blurred content.
    pub fn is_clear(&self) -> bool {
        self.data.iter().all(|&v| v == MASK_CLEAR)
    }

    /// Number of pixels with non-zero coverage.
    pub fn coverage(&self) -> usize {
        self.data.iter().filter(|&&v| v != MASK_CLEAR).count()
    }

    /// Tight bounds of the non-zero area, or `None` for a clear mask.
    pub fn bounds(&self) -> Option<MaskBounds> {
        let w = self.width as usize;
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for (y, row) in self.data.chunks_exact(w.max(1)).enumerate() {
            let Some(first) = row.iter().position(|&v| v != MASK_CLEAR) else {
                continue;
            };
            let last = row.iter().rposition(|&v| v != MASK_CLEAR).unwrap_or(first);
            min_x = min_x.min(first);
            max_x = max_x.max(last);
            min_y = min_y.min(y);
            max_y = y;
        }
        if min_x == usize::MAX {
            return None;
        }
        Some(MaskBounds {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        })
    }
}
