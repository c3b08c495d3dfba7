//! Zoom-rectangle navigation: a small camera model a host can use to derive
//! the [`TransformStack`] it feeds into the selection engine.
//!
//! The visible region is described by a rectangle in world space; the view
//! matrix centers and scales that rectangle into an orthographic projection
//! sized to the viewport. Pan and zoom mutate the rectangle, never the
//! matrices directly, so the transforms stay consistent by construction.

use glam::{Mat4, Vec2, Vec3};

use crate::transform::{TransformStack, WorldRect};

#[derive(Clone, Copy, Debug)]
pub struct Navigator {
    viewport: Vec2,
    zoom_min: Vec2,
    zoom_size: Vec2,
    /// Breathing room kept around the zoom rectangle, in viewport pixels.
    zoom_margin: f32,
}

impl Navigator {
    /// Camera showing `world_bounds` in full.
    pub fn new(viewport: Vec2, world_bounds: WorldRect) -> Self {
        Self {
            viewport,
            zoom_min: world_bounds.min,
            zoom_size: Vec2::new(world_bounds.width(), world_bounds.height()),
            zoom_margin: 0.0,
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn set_zoom_margin(&mut self, margin: f32) {
        self.zoom_margin = margin.max(0.0);
    }

    /// The world-space region currently mapped to the viewport.
    pub fn zoom_rectangle(&self) -> WorldRect {
        WorldRect::new(self.zoom_min, self.zoom_min + self.zoom_size)
    }

    /// Jump to a new visible region.
    pub fn zoom_to(&mut self, rect: WorldRect) {
        self.zoom_min = rect.min;
        self.zoom_size = Vec2::new(rect.width(), rect.height());
    }

    /// World units per screen pixel along x; larger values mean further out.
    pub fn scale_factor(&self) -> f32 {
        let fit_x = self.viewport.x / self.zoom_size.x.max(f32::MIN_POSITIVE);
        let fit_y = self.viewport.y / self.zoom_size.y.max(f32::MIN_POSITIVE);
        let margin_shrink = 1.0 - (2.0 * self.zoom_margin) / self.viewport.max_element();

        fit_x.min(fit_y) * margin_shrink
    }

    /// Derive the full transform stack for a layer with the given model
    /// matrix. World y points down, matching screen space and the mask's
    /// row order.
    pub fn transforms(&self, model: Mat4) -> TransformStack {
        let center = self.zoom_min + 0.5 * self.zoom_size;
        let scale = self.scale_factor();

        let view = Mat4::from_scale(Vec3::new(scale, scale, 1.0))
            * Mat4::from_translation(Vec3::new(-center.x, -center.y, 0.0));

        let half = 0.5 * self.viewport;
        let projection = Mat4::orthographic_rh(-half.x, half.x, half.y, -half.y, -1000.0, 1000.0);

        TransformStack::new(projection, view, model, self.viewport)
    }

    /// Shift the visible region by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        let transforms = self.transforms(Mat4::IDENTITY);

        let (Ok(from), Ok(to)) = (
            transforms.screen_to_world(Vec2::ZERO),
            transforms.screen_to_world(screen_delta),
        ) else {
            return;
        };

        self.zoom_min += Vec2::new(to.x - from.x, to.y - from.y);
    }

    /// Zoom by `factor` while keeping the world position under
    /// `screen_point` fixed on screen.
    pub fn zoom_around(&mut self, screen_point: Vec2, factor: f32) {
        if !(factor > 0.0) {
            return;
        }

        let transforms = self.transforms(Mat4::IDENTITY);

        let Ok(pivot) = transforms.screen_to_world(screen_point) else {
            return;
        };
        let pivot = Vec2::new(pivot.x, pivot.y);

        self.zoom_min = pivot + (self.zoom_min - pivot) / factor;
        self.zoom_size /= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_extents_make_screen_equal_world() {
        let navigator = Navigator::new(Vec2::new(4.0, 4.0), WorldRect::from_image_size(4, 4));
        let transforms = navigator.transforms(Mat4::IDENTITY);

        let world = transforms.screen_to_world(Vec2::new(1.0, 3.0)).unwrap();

        assert!((world.x - 1.0).abs() < 1e-4);
        assert!((world.y - 3.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_around_keeps_the_pivot_fixed() {
        let mut navigator = Navigator::new(Vec2::new(256.0, 256.0), WorldRect::from_image_size(64, 64));

        let pivot_screen = Vec2::new(96.0, 160.0);
        let before = navigator
            .transforms(Mat4::IDENTITY)
            .screen_to_world(pivot_screen)
            .unwrap();

        navigator.zoom_around(pivot_screen, 2.0);

        let after = navigator
            .transforms(Mat4::IDENTITY)
            .screen_to_world(pivot_screen)
            .unwrap();

        assert!(before.distance(after) < 1e-3);
    }

    #[test]
    fn pan_keeps_the_grabbed_point_under_the_pointer() {
        let mut navigator = Navigator::new(Vec2::new(128.0, 128.0), WorldRect::from_image_size(64, 64));

        let grab = navigator
            .transforms(Mat4::IDENTITY)
            .screen_to_world(Vec2::new(40.0, 40.0))
            .unwrap();

        // Dragging the content 10 px right means the grabbed world point is
        // now under screen x 50.
        navigator.pan_by(Vec2::new(-10.0, 0.0));

        let moved = navigator
            .transforms(Mat4::IDENTITY)
            .screen_to_world(Vec2::new(50.0, 0.0) + Vec2::new(0.0, 40.0))
            .unwrap();

        assert!(grab.distance(moved) < 1e-3);
    }

    #[test]
    fn zooming_in_shrinks_the_visible_region() {
        let mut navigator = Navigator::new(Vec2::new(100.0, 100.0), WorldRect::from_image_size(50, 50));

        navigator.zoom_around(Vec2::new(50.0, 50.0), 2.0);
        let rect = navigator.zoom_rectangle();

        assert!((rect.width() - 25.0).abs() < 1e-3);
        assert!((rect.height() - 25.0).abs() < 1e-3);
    }
}
