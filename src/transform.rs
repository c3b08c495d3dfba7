use glam::{Mat4, Vec2, Vec3};
use thiserror::Error;

/// Failure of a screen/world conversion. Callers treat any of these as
/// "the pointer did not hit the layer" rather than surfacing them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("model-view-projection matrix is singular")]
    SingularMatrix,
    #[error("coordinate is not finite")]
    NonFinite,
    #[error("projection ray does not intersect the image plane")]
    NoPlaneIntersection,
}

/// World-space bounding rectangle of a raster layer.
///
/// The rectangle lives in the same space as the output of
/// [`TransformStack::screen_to_world`] (layer-local world units) and is used
/// to normalize world positions into `[0, 1]²` texture coordinates so that
/// coverage evaluation is independent of the current zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle spanning an image placed with its top-left pixel at the
    /// world origin, one world unit per pixel.
    pub fn from_image_size(width: u32, height: u32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width as f32, height as f32),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// A rectangle with no area cannot normalize anything.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Normalize a world position against this rectangle. Positions inside
    /// the rectangle map to `[0, 1]²`; positions outside fall outside that
    /// range, which downstream coverage tests reject naturally.
    pub fn uv(&self, world: Vec2) -> Vec2 {
        (world - self.min) / Vec2::new(self.width(), self.height())
    }
}

/// The live view/projection/model stack plus the viewport size, owned by the
/// host's renderer and handed to the selection engine by reference.
///
/// Screen coordinates are y-down with the origin at the top-left of the
/// viewport. "World" here means the layer-local space produced by the full
/// `projection · view · model` composition, i.e. the space in which the
/// layer's [`WorldRect`] is expressed.
#[derive(Clone, Copy, Debug)]
pub struct TransformStack {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    /// Viewport size in physical screen pixels.
    pub viewport: Vec2,
}

impl TransformStack {
    pub fn new(projection: Mat4, view: Mat4, model: Mat4, viewport: Vec2) -> Self {
        Self {
            projection,
            view,
            model,
            viewport,
        }
    }

    /// Stack whose orthographic projection maps `rect` exactly onto the
    /// viewport, with world y pointing down like screen y.
    ///
    /// When `rect` has the same size as the viewport, screen coordinates and
    /// world coordinates coincide. A viewport twice the rectangle size yields
    /// a 2x zoom, and so on.
    pub fn fit(viewport: Vec2, rect: WorldRect) -> Self {
        // Swapped bottom/top so that world y grows downward on screen.
        let projection =
            Mat4::orthographic_rh(rect.min.x, rect.max.x, rect.max.y, rect.min.y, -1000.0, 1000.0);

        Self::new(projection, Mat4::IDENTITY, Mat4::IDENTITY, viewport)
    }

    pub fn model_view(&self) -> Mat4 {
        self.view * self.model
    }

    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    /// Unproject a screen point onto the layer's `z = 0` plane.
    pub fn screen_to_world(&self, screen: Vec2) -> Result<Vec3, TransformError> {
        if !screen.is_finite() || !(self.viewport.x > 0.0 && self.viewport.y > 0.0) {
            return Err(TransformError::NonFinite);
        }

        let mvp = self.model_view_projection();

        if mvp.determinant().abs() <= f32::MIN_POSITIVE {
            return Err(TransformError::SingularMatrix);
        }

        let inverse = mvp.inverse();
        let ndc = self.screen_to_ndc(screen);

        // Two depths define the pick ray through the pixel; intersect it
        // with the z = 0 plane rather than trusting a single unprojection.
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));

        if !near.is_finite() || !far.is_finite() {
            return Err(TransformError::SingularMatrix);
        }

        let dz = far.z - near.z;

        if dz.abs() <= f32::EPSILON {
            // Ray runs parallel to the plane; accept it only when it already
            // lies (numerically) on the plane.
            if near.z.abs() < 1e-4 {
                return Ok(Vec3::new(near.x, near.y, 0.0));
            }
            return Err(TransformError::NoPlaneIntersection);
        }

        let hit = near.lerp(far, -near.z / dz);

        if !hit.is_finite() {
            return Err(TransformError::NonFinite);
        }

        Ok(Vec3::new(hit.x, hit.y, 0.0))
    }

    /// Forward projection of a world position to screen pixels. Inverse of
    /// [`Self::screen_to_world`] up to floating point rounding.
    pub fn world_to_screen(&self, world: Vec3) -> Result<Vec2, TransformError> {
        if !world.is_finite() {
            return Err(TransformError::NonFinite);
        }

        let clip = self.model_view_projection() * world.extend(1.0);

        if clip.w.abs() <= f32::MIN_POSITIVE {
            return Err(TransformError::NoPlaneIntersection);
        }

        let ndc = clip.truncate() / clip.w;
        let screen = self.ndc_to_screen(Vec2::new(ndc.x, ndc.y));

        if !screen.is_finite() {
            return Err(TransformError::NonFinite);
        }

        Ok(screen)
    }

    /// Length in world units of a horizontal screen-space distance, measured
    /// by unprojecting both endpoints. Used to convert the brush radius from
    /// screen pixels to world units at the current zoom.
    pub fn screen_distance_to_world(&self, pixels: f32) -> Result<f32, TransformError> {
        let origin = self.screen_to_world(Vec2::ZERO)?;
        let offset = self.screen_to_world(Vec2::new(pixels, 0.0))?;

        Ok(origin.distance(offset))
    }

    fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * screen.x / self.viewport.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.y,
        )
    }

    fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }
}
