use glam::Vec2;
use image::{GrayImage, Luma};
use rayon::prelude::*;
use thiserror::Error;

/// Mask value written for covered pixels. Anything non-zero counts as
/// covered; 255 keeps the buffer directly renderable as an overlay alpha.
pub const COVERED: u8 = 255;

/// Geometry that cannot produce coverage. These are swallowed by the
/// session (the gesture simply has no effect yet), never surfaced to the
/// user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidGeometryError {
    #[error("image dimensions are degenerate")]
    DegenerateImage,
    #[error("polygon has fewer than three vertices")]
    DegeneratePolygon,
    #[error("brush stroke is empty or has a non-positive radius")]
    DegenerateBrush,
    #[error("world rectangle has zero area")]
    DegenerateWorldRect,
    #[error("pointer trail is empty")]
    EmptyTrail,
}

// ============================================================================
// COVERAGE SHAPES
// ============================================================================

/// The per-tool geometric descriptor, resolved to texture (UV) space so that
/// coverage evaluation is independent of the live zoom/pan transforms.
#[derive(Clone, Debug, PartialEq)]
pub enum CoverageShape {
    /// Axis-aligned rectangle between two normalized corners. Corners are
    /// re-ordered on construction, so the covered region never depends on
    /// the drag direction.
    Rectangle { min: Vec2, max: Vec2 },
    /// Closed polygon (a freehand lasso outline is closed implicitly by
    /// connecting its last vertex back to the first).
    Polygon { points: Vec<Vec2> },
    /// Swept circle between two stroke positions. Positions are UV; the
    /// radius is in image pixels, hence the image size rides along so the
    /// test can evaluate in pixel units.
    Capsule { from: Vec2, to: Vec2, radius: f32, image_size: Vec2 },
    /// The single texel containing the sampled position.
    Sample { point: Vec2 },
}

impl CoverageShape {
    /// Rectangle from two corners in any order.
    pub fn rectangle(a: Vec2, b: Vec2) -> Self {
        CoverageShape::Rectangle {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

/// Pure membership test: is the pixel whose center sits at `uv` inside the
/// shape? `image_size` is the raster's pixel dimensions.
///
/// This is the portable contract every coverage path reduces to. The bulk
/// rasterization below takes shortcuts (scanline fill, bounding boxes) but
/// agrees with this predicate at every pixel center.
pub fn coverage_test(uv: Vec2, image_size: Vec2, shape: &CoverageShape) -> bool {
    match shape {
        CoverageShape::Rectangle { min, max } => {
            uv.x >= min.x && uv.x <= max.x && uv.y >= min.y && uv.y <= max.y
        }
        CoverageShape::Polygon { points } => point_in_polygon(uv, points),
        CoverageShape::Capsule {
            from,
            to,
            radius,
            image_size: shape_size,
        } => {
            let p = uv * *shape_size;
            distance_to_segment(p, *from * *shape_size, *to * *shape_size) <= *radius
        }
        CoverageShape::Sample { point } => {
            texel_of(*point, image_size).is_some_and(|texel| texel_of(uv, image_size) == Some(texel))
        }
    }
}

/// Even-odd (crossing) rule, the same parity the scanline fill produces.
fn point_in_polygon(p: Vec2, points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;

    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);

        if (a.y > p.y) != (b.y > p.y) {
            let x_at = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);

            if p.x < x_at {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();

    if length_squared <= f32::EPSILON {
        return p.distance(a);
    }

    let t = ((p - a).dot(ab) / length_squared).clamp(0.0, 1.0);

    p.distance(a + t * ab)
}

/// The texel containing a UV position, or `None` when the position falls
/// outside the image.
fn texel_of(uv: Vec2, image_size: Vec2) -> Option<(u32, u32)> {
    let x = (uv.x * image_size.x).floor();
    let y = (uv.y * image_size.y).floor();

    if x >= 0.0 && x < image_size.x && y >= 0.0 && y < image_size.y {
        Some((x as u32, y as u32))
    } else {
        None
    }
}

// ============================================================================
// COVERAGE MASK
// ============================================================================

/// Single-channel 8-bit coverage buffer with the same pixel dimensions as
/// the source raster (never the viewport). Origin top-left, row-major. Zero
/// means "not covered by the current gesture"; [`COVERED`] means covered.
///
/// Allocated once per layer and reused across gestures; only [`reset`]
/// (gesture start) and the fill/stamp operations below ever touch it.
///
/// [`reset`]: CoverageMask::reset
#[derive(Clone, Debug)]
pub struct CoverageMask {
    image: GrayImage,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn image_size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// The raw buffer, for overlay rendering or row-major scanning.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Number of covered pixels.
    pub fn covered_count(&self) -> usize {
        self.as_raw().iter().filter(|value| **value != 0).count()
    }

    /// Clear all coverage. Called at gesture start.
    pub fn reset(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Luma([0]);
        }
    }

    /// Full recompute: replace the whole mask with the coverage of `shape`.
    pub fn fill_shape(&mut self, shape: &CoverageShape) -> Result<(), InvalidGeometryError> {
        if self.is_degenerate() {
            return Err(InvalidGeometryError::DegenerateImage);
        }

        match shape {
            CoverageShape::Polygon { points } => self.fill_polygon(points),
            CoverageShape::Sample { point } => self.fill_sample(*point),
            _ => {
                self.fill_by_predicate(shape);
                Ok(())
            }
        }
    }

    /// Evaluate the pure predicate at every pixel center, one row per
    /// rayon task.
    fn fill_by_predicate(&mut self, shape: &CoverageShape) {
        let width = self.width() as usize;
        let image_size = self.image_size();
        let raw: &mut [u8] = &mut self.image;

        raw.par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let v = (y as f32 + 0.5) / image_size.y;

                for (x, value) in row.iter_mut().enumerate() {
                    let uv = Vec2::new((x as f32 + 0.5) / image_size.x, v);

                    *value = if coverage_test(uv, image_size, shape) {
                        COVERED
                    } else {
                        0
                    };
                }
            });
    }

    /// Scanline fill at pixel-row centers. Matches the even-odd predicate at
    /// every pixel center while touching each row's edges only once.
    fn fill_polygon(&mut self, points: &[Vec2]) -> Result<(), InvalidGeometryError> {
        if points.len() < 3 {
            return Err(InvalidGeometryError::DegeneratePolygon);
        }

        let width = self.width() as usize;
        let image_size = self.image_size();

        // Work in pixel units; the closing edge back to the first vertex is
        // implicit in the index wrap below.
        let vertices: Vec<Vec2> = points.iter().map(|point| *point * image_size).collect();

        let raw: &mut [u8] = &mut self.image;

        raw.par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                row.fill(0);

                let center_y = y as f32 + 0.5;
                let mut nodes: Vec<f32> = Vec::new();

                // Same crossing rule as `point_in_polygon`, so the fill and
                // the predicate agree at every pixel center.
                for i in 0..vertices.len() {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % vertices.len()];

                    if (a.y > center_y) != (b.y > center_y) {
                        let t = (center_y - a.y) / (b.y - a.y);
                        nodes.push(a.x + t * (b.x - a.x));
                    }
                }

                nodes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

                // Fill pixels whose center x lands between node pairs.
                for pair in nodes.chunks_exact(2) {
                    let start = ((pair[0] - 0.5).ceil().max(0.0)) as usize;
                    let end = ((pair[1] - 0.5).ceil().clamp(0.0, width as f32)) as usize;

                    if start < end {
                        row[start..end].fill(COVERED);
                    }
                }
            });

        Ok(())
    }

    fn fill_sample(&mut self, point: Vec2) -> Result<(), InvalidGeometryError> {
        let image_size = self.image_size();

        self.reset();

        if let Some((x, y)) = texel_of(point, image_size) {
            self.image.put_pixel(x, y, Luma([COVERED]));
        }

        Ok(())
    }

    /// Incremental brush stamp: OR the capsule between two stroke positions
    /// (image-pixel coordinates, image-pixel radius) into the existing mask.
    ///
    /// Only the capsule's bounding box is visited and covered pixels are
    /// never cleared, so repeated stamping is idempotent and coverage grows
    /// monotonically over a gesture.
    pub fn stamp_capsule(
        &mut self,
        from: Vec2,
        to: Vec2,
        radius: f32,
    ) -> Result<(), InvalidGeometryError> {
        if self.is_degenerate() {
            return Err(InvalidGeometryError::DegenerateImage);
        }

        if !from.is_finite() || !to.is_finite() || !(radius > 0.0) {
            return Err(InvalidGeometryError::DegenerateBrush);
        }

        let width = self.width();
        let height = self.height();

        let min = from.min(to) - Vec2::splat(radius);
        let max = from.max(to) + Vec2::splat(radius);

        let x0 = (min.x - 0.5).floor().max(0.0) as u32;
        let y0 = (min.y - 0.5).floor().max(0.0) as u32;
        let x1 = ((max.x + 0.5).ceil() as u32).min(width);
        let y1 = ((max.y + 0.5).ceil() as u32).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

                if distance_to_segment(center, from, to) <= radius {
                    self.image.put_pixel(x, y, Luma([COVERED]));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered_set(mask: &CoverageMask) -> Vec<u32> {
        mask.as_raw()
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(index, _)| index as u32)
            .collect()
    }

    #[test]
    fn rectangle_covers_pixels_whose_centers_are_inside() {
        let mut mask = CoverageMask::new(4, 4);

        mask.fill_shape(&CoverageShape::rectangle(
            Vec2::ZERO,
            Vec2::new(0.5, 0.5),
        ))
        .unwrap();

        assert_eq!(covered_set(&mask), vec![0, 1, 4, 5]);
    }

    #[test]
    fn rectangle_is_corner_order_independent() {
        let a = Vec2::new(0.1, 0.9);
        let b = Vec2::new(0.8, 0.2);

        let mut forward = CoverageMask::new(16, 16);
        let mut backward = CoverageMask::new(16, 16);

        forward.fill_shape(&CoverageShape::rectangle(a, b)).unwrap();
        backward.fill_shape(&CoverageShape::rectangle(b, a)).unwrap();

        assert_eq!(forward.as_raw(), backward.as_raw());
    }

    #[test]
    fn scanline_fill_matches_the_point_predicate() {
        let points = vec![
            Vec2::new(0.1, 0.1),
            Vec2::new(0.9, 0.25),
            Vec2::new(0.7, 0.85),
            Vec2::new(0.3, 0.6),
        ];

        let mut mask = CoverageMask::new(24, 24);
        mask.fill_shape(&CoverageShape::Polygon {
            points: points.clone(),
        })
        .unwrap();

        let image_size = Vec2::new(24.0, 24.0);
        let shape = CoverageShape::Polygon { points };

        for y in 0..24u32 {
            for x in 0..24u32 {
                let uv = Vec2::new((x as f32 + 0.5) / 24.0, (y as f32 + 0.5) / 24.0);
                let expected = coverage_test(uv, image_size, &shape);
                let actual = mask.image().get_pixel(x, y).0[0] != 0;

                assert_eq!(actual, expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn polygon_with_too_few_vertices_is_rejected() {
        let mut mask = CoverageMask::new(8, 8);

        let result = mask.fill_shape(&CoverageShape::Polygon {
            points: vec![Vec2::ZERO, Vec2::ONE],
        });

        assert_eq!(result, Err(InvalidGeometryError::DegeneratePolygon));
        assert_eq!(mask.covered_count(), 0);
    }

    #[test]
    fn degenerate_image_is_a_no_op() {
        let mut mask = CoverageMask::new(0, 0);

        let result = mask.fill_shape(&CoverageShape::rectangle(Vec2::ZERO, Vec2::ONE));

        assert_eq!(result, Err(InvalidGeometryError::DegenerateImage));
    }

    #[test]
    fn sample_covers_exactly_one_texel() {
        let mut mask = CoverageMask::new(4, 4);

        mask.fill_shape(&CoverageShape::Sample {
            point: Vec2::new(0.6, 0.3),
        })
        .unwrap();

        // u = 0.6 -> column 2, v = 0.3 -> row 1.
        assert_eq!(covered_set(&mask), vec![6]);
    }

    #[test]
    fn sample_outside_the_image_covers_nothing() {
        let mut mask = CoverageMask::new(4, 4);

        mask.fill_shape(&CoverageShape::Sample {
            point: Vec2::new(1.5, 0.5),
        })
        .unwrap();

        assert_eq!(mask.covered_count(), 0);
    }

    #[test]
    fn capsule_stamping_only_grows_coverage() {
        let mut mask = CoverageMask::new(32, 32);

        mask.stamp_capsule(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), 2.0)
            .unwrap();
        let first = covered_set(&mask);

        mask.stamp_capsule(Vec2::new(4.0, 4.0), Vec2::new(20.0, 4.0), 2.0)
            .unwrap();
        let second = covered_set(&mask);

        assert!(!first.is_empty());
        assert!(first.iter().all(|index| second.contains(index)));
        assert!(second.len() > first.len());
    }

    #[test]
    fn single_point_stroke_stamps_a_circle() {
        let mut mask = CoverageMask::new(16, 16);

        mask.stamp_capsule(Vec2::new(8.0, 8.0), Vec2::new(8.0, 8.0), 3.0)
            .unwrap();

        assert!(mask.image().get_pixel(7, 7).0[0] != 0);
        assert!(mask.image().get_pixel(8, 10).0[0] != 0);
        assert_eq!(mask.image().get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.image().get_pixel(15, 8).0[0], 0);
    }

    #[test]
    fn zero_radius_stroke_is_rejected() {
        let mut mask = CoverageMask::new(8, 8);

        assert_eq!(
            mask.stamp_capsule(Vec2::ZERO, Vec2::ONE, 0.0),
            Err(InvalidGeometryError::DegenerateBrush)
        );
    }
}
