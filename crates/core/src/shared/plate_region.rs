#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A detected plate outline in image pixel coordinates.
///
/// The polygon is closed implicitly: the last vertex connects back to the
/// first. Vertex order is whatever the detector reported; nothing here
/// assumes convexity or a particular winding.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateRegion {
    points: Vec<Point>,
}

impl PlateRegion {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a region from interleaved `[x0, y0, x1, y1, ...]` coordinates.
    ///
    /// Returns `None` when the list has an odd length or holds non-finite values.
    pub fn from_flat(coords: &[f64]) -> Option<Self> {
        if coords.len() % 2 != 0 || coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let points = coords
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        Some(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterates over the closed edge list, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Absolute shoelace area. Self-intersecting outlines report the net area.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: f64 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        (twice / 2.0).abs()
    }

    /// Fewer than three vertices, or all vertices on one horizontal or
    /// vertical line. Such outlines cover no pixels.
    pub fn is_degenerate(&self) -> bool {
        match self.bounding_box() {
            Some((x0, y0, x1, y1)) => self.points.len() < 3 || x0 == x1 || y0 == y1,
            None => true,
        }
    }

    /// `(min_x, min_y, max_x, max_y)`, or `None` for an empty polygon.
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let init = (first.x, first.y, first.x, first.y);
        Some(self.points.iter().fold(init, |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn square(x: f64, y: f64, size: f64) -> PlateRegion {
        PlateRegion::from_flat(&[x, y, x + size, y, x + size, y + size, x, y + size]).unwrap()
    }

    #[test]
    fn test_from_flat_pairs_coordinates() {
        let r = PlateRegion::from_flat(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(r.points(), &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_from_flat_rejects_odd_length() {
        assert!(PlateRegion::from_flat(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_from_flat_rejects_nan() {
        assert!(PlateRegion::from_flat(&[1.0, f64::NAN, 3.0, 4.0]).is_none());
    }

    #[test]
    fn test_area_of_square() {
        assert_relative_eq!(square(10.0, 10.0, 20.0).area(), 400.0);
    }

    #[test]
    fn test_area_ignores_winding() {
        let cw = PlateRegion::from_flat(&[0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0]).unwrap();
        assert_relative_eq!(cw.area(), 100.0);
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::two_points(vec![0.0, 0.0, 5.0, 5.0])]
    #[case::horizontal(vec![0.0, 3.0, 5.0, 3.0, 10.0, 3.0])]
    #[case::vertical(vec![2.0, 0.0, 2.0, 5.0, 2.0, 9.0])]
    fn test_degenerate(#[case] coords: Vec<f64>) {
        assert!(PlateRegion::from_flat(&coords).unwrap().is_degenerate());
    }

    #[test]
    fn test_square_not_degenerate() {
        assert!(!square(0.0, 0.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_bowtie_not_degenerate_despite_zero_net_area() {
        let bowtie = PlateRegion::from_flat(&[0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 0.0, 10.0]).unwrap();
        assert_relative_eq!(bowtie.area(), 0.0);
        assert!(!bowtie.is_degenerate());
    }

    #[test]
    fn test_bounding_box() {
        let r = PlateRegion::from_flat(&[5.0, 1.0, 9.0, 3.0, 2.0, 7.0]).unwrap();
        assert_eq!(r.bounding_box(), Some((2.0, 1.0, 9.0, 7.0)));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert_eq!(PlateRegion::new(vec![]).bounding_box(), None);
    }
}
