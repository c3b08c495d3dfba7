use glam::Vec2;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{InputEvent, Key, PointerButtons};
use crate::raster::{CoverageMask, CoverageShape, InvalidGeometryError};
use crate::selection::{LayerSelection, ValidityMask, combine, covered_indices};
use crate::tool::{
    BRUSH_RADIUS_DELTA, BRUSH_RADIUS_DEFAULT, BRUSH_RADIUS_MAX, BRUSH_RADIUS_MIN, GesturePhase,
    SelectionModifier, SelectionTool, ToolState,
};
use crate::transform::{TransformError, TransformStack, WorldRect};

/// Upper bound on mask allocation, matching the canvas sanity clamp of
/// roughly 256 megapixels.
pub const MAX_MASK_PIXELS: u64 = 256 * 1024 * 1024;

/// Failure to set up per-layer selection resources. Fatal for the layer's
/// selection capability (the host disables the tool for that layer) but
/// never for the host itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ResourceInitError {
    #[error("mask buffer {width}x{height} exceeds the pixel budget")]
    MaskTooLarge { width: u32, height: u32 },
    #[error(
        "validity mask is {validity_width}x{validity_height} but the image is {width}x{height}"
    )]
    ValidityMismatch {
        width: u32,
        height: u32,
        validity_width: u32,
        validity_height: u32,
    },
}

/// Per-gesture failures that leave state untouched. Local to the session;
/// the public surface swallows them after logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
enum GestureError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Geometry(#[from] InvalidGeometryError),
}

/// Persistable selection preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub tool: SelectionTool,
    pub modifier: SelectionModifier,
    /// Brush tip radius in screen pixels.
    pub brush_radius: f32,
    /// Radius change per wheel notch.
    pub brush_radius_delta: f32,
    /// When true, every pointer move publishes the interim combination in
    /// addition to the authoritative publish at commit.
    pub notify_during_selection: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tool: SelectionTool::default(),
            modifier: SelectionModifier::default(),
            brush_radius: BRUSH_RADIUS_DEFAULT,
            brush_radius_delta: BRUSH_RADIUS_DELTA,
            notify_during_selection: false,
        }
    }
}

/// What an operation did, so the host knows whether to refresh its overlay
/// and whether a new selection was published to the dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub mask_changed: bool,
    pub selection_published: bool,
}

impl EventOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn mask() -> Self {
        Self {
            mask_changed: true,
            selection_published: false,
        }
    }

    fn published() -> Self {
        Self {
            mask_changed: true,
            selection_published: true,
        }
    }
}

// ============================================================================
// SELECTION SESSION
// ============================================================================

/// Owns one layer's gesture state and coverage mask, and mediates between
/// host input events, the rasterizer and the selection combiner.
///
/// All collaborators are passed in by reference per call: the transform
/// stack stays owned by the renderer and the selection index set stays owned
/// by the dataset. Everything here is synchronous; the caller observes each
/// mutation as soon as the call returns.
pub struct SelectionSession {
    settings: SessionSettings,
    /// Gesture state; `Some` exactly while a gesture is active.
    gesture: Option<ToolState>,
    mask: CoverageMask,
    validity: ValidityMask,
    world_rect: WorldRect,
    /// Transient modifier forced by a held Shift/Ctrl, reverting on release.
    override_modifier: Option<SelectionModifier>,
}

impl SelectionSession {
    /// Set up selection for a layer of the given pixel dimensions. The mask
    /// is allocated once here and reused for every gesture.
    pub fn new(
        width: u32,
        height: u32,
        validity: ValidityMask,
    ) -> Result<Self, ResourceInitError> {
        if width as u64 * height as u64 > MAX_MASK_PIXELS {
            error!("selection disabled: mask buffer {width}x{height} exceeds the pixel budget");
            return Err(ResourceInitError::MaskTooLarge { width, height });
        }

        if validity.width() != width || validity.height() != height {
            error!(
                "selection disabled: validity mask {}x{} does not match image {width}x{height}",
                validity.width(),
                validity.height()
            );
            return Err(ResourceInitError::ValidityMismatch {
                width,
                height,
                validity_width: validity.width(),
                validity_height: validity.height(),
            });
        }

        Ok(Self {
            settings: SessionSettings::default(),
            gesture: None,
            mask: CoverageMask::new(width, height),
            validity,
            world_rect: WorldRect::from_image_size(width, height),
            override_modifier: None,
        })
    }

    /// Place the layer elsewhere in world space than the default of one
    /// world unit per pixel with the top-left pixel at the origin.
    pub fn with_world_rect(mut self, world_rect: WorldRect) -> Self {
        self.world_rect = world_rect;
        self
    }

    // ---- accessors ---------------------------------------------------------

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn phase(&self) -> GesturePhase {
        if self.gesture.is_some() {
            GesturePhase::Active
        } else {
            GesturePhase::Idle
        }
    }

    /// The live coverage mask, for the host to render as an overlay.
    pub fn mask(&self) -> &CoverageMask {
        &self.mask
    }

    /// The modifier a gesture started now would commit under.
    pub fn effective_modifier(&self) -> SelectionModifier {
        self.override_modifier.unwrap_or(self.settings.modifier)
    }

    /// The brush tip radius in image pixels under the current zoom.
    pub fn brush_radius_in_image_px(
        &self,
        transforms: &TransformStack,
    ) -> Result<f32, TransformError> {
        if self.world_rect.is_degenerate() {
            return Err(TransformError::NonFinite);
        }

        let radius_screen = self
            .gesture
            .as_ref()
            .map(|gesture| gesture.brush_radius())
            .unwrap_or(self.settings.brush_radius);
        let radius_world = transforms.screen_distance_to_world(radius_screen)?;

        Ok(radius_world * self.mask.width() as f32 / self.world_rect.width())
    }

    // ---- settings mutation -------------------------------------------------

    /// Arm the session with a tool and modifier in one call. Any in-flight
    /// gesture is dropped unpublished; the new gesture becomes active on the
    /// next primary press.
    pub fn start_session(&mut self, tool: SelectionTool, modifier: SelectionModifier) {
        self.abort();
        self.settings.tool = tool;
        self.settings.modifier = modifier;
    }

    /// Switch the active tool. Ignored while a gesture is in flight; the
    /// gesture must finish or abort first.
    pub fn set_tool(&mut self, tool: SelectionTool) {
        if self.gesture.is_some() {
            debug!("ignoring tool switch to {} during a gesture", tool.label());
            return;
        }

        self.settings.tool = tool;
    }

    pub fn set_modifier(&mut self, modifier: SelectionModifier) {
        self.settings.modifier = modifier;
    }

    pub fn set_notify_during_selection(&mut self, notify: bool) {
        self.settings.notify_during_selection = notify;
    }

    pub fn set_brush_radius(&mut self, radius: f32) {
        self.settings.brush_radius = radius.clamp(BRUSH_RADIUS_MIN, BRUSH_RADIUS_MAX);

        if let Some(gesture) = &mut self.gesture {
            gesture.set_brush_radius(self.settings.brush_radius);
        }
    }

    pub fn set_brush_radius_delta(&mut self, delta: f32) {
        self.settings.brush_radius_delta = delta.clamp(0.001, BRUSH_RADIUS_MAX);
    }

    pub fn increase_brush(&mut self) {
        self.set_brush_radius(self.settings.brush_radius + self.settings.brush_radius_delta);
    }

    pub fn decrease_brush(&mut self) {
        self.set_brush_radius(self.settings.brush_radius - self.settings.brush_radius_delta);
    }

    // ---- event dispatch ----------------------------------------------------

    /// Feed one host input event through the gesture state machine.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        transforms: &TransformStack,
        selection: &mut LayerSelection,
    ) -> EventOutcome {
        match *event {
            InputEvent::PointerPressed { position, buttons } => {
                if buttons.contains(PointerButtons::SECONDARY) {
                    return self.finalize_polygon(transforms, selection);
                }

                if buttons.contains(PointerButtons::PRIMARY) {
                    return self.pointer_pressed(position, transforms, selection);
                }

                EventOutcome::none()
            }
            InputEvent::PointerMoved { position, .. } => {
                self.pointer_moved(position, transforms, selection)
            }
            InputEvent::PointerReleased { .. } => self.pointer_released(selection),
            InputEvent::Wheel { delta } => {
                if self.settings.tool == SelectionTool::Brush && delta != 0.0 {
                    if delta > 0.0 {
                        self.increase_brush();
                    } else {
                        self.decrease_brush();
                    }
                }

                EventOutcome::none()
            }
            InputEvent::KeyPressed { key } => self.key_pressed(key),
            InputEvent::KeyReleased { key } => {
                match key {
                    Key::Shift if self.override_modifier == Some(SelectionModifier::Add) => {
                        self.override_modifier = None;
                    }
                    Key::Control if self.override_modifier == Some(SelectionModifier::Subtract) => {
                        self.override_modifier = None;
                    }
                    _ => {}
                }

                EventOutcome::none()
            }
        }
    }

    fn key_pressed(&mut self, key: Key) -> EventOutcome {
        match key {
            Key::Escape => {
                let abortable = self
                    .gesture
                    .as_ref()
                    .is_some_and(|gesture| gesture.kind.abortable());

                if abortable {
                    return self.abort();
                }
            }
            Key::Shift => self.override_modifier = Some(SelectionModifier::Add),
            Key::Control => self.override_modifier = Some(SelectionModifier::Subtract),
            _ => {
                if let Some(tool) = SelectionTool::from_hotkey(key) {
                    self.set_tool(tool);
                }
            }
        }

        EventOutcome::none()
    }

    // ---- gesture lifecycle -------------------------------------------------

    /// Primary button press: start a gesture, or append a vertex to an
    /// in-flight polygon.
    pub fn pointer_pressed(
        &mut self,
        position: Vec2,
        transforms: &TransformStack,
        selection: &mut LayerSelection,
    ) -> EventOutcome {
        if let Some(gesture) = &mut self.gesture {
            // Only the polygon gesture spans multiple presses.
            if gesture.kind.multi_click() {
                gesture.add_vertex(position);
                return self.recompute(transforms);
            }

            return EventOutcome::none();
        }

        let mut gesture = ToolState::new(
            self.settings.tool,
            self.effective_modifier(),
            self.settings.brush_radius,
        );
        gesture.begin_at(position);

        self.gesture = Some(gesture);
        self.mask.reset();

        let mut outcome = self.recompute(transforms);
        outcome.mask_changed = true;

        // A sample press already publishes; no release is required.
        if self.settings.tool.auto_commits() {
            self.publish_interim(selection);
            outcome.selection_published = true;
        }

        outcome
    }

    /// Pointer move during a gesture: fold the position into the trail and
    /// refresh coverage. Returns what changed so the host can repaint.
    pub fn pointer_moved(
        &mut self,
        position: Vec2,
        transforms: &TransformStack,
        selection: &mut LayerSelection,
    ) -> EventOutcome {
        let Some(gesture) = &mut self.gesture else {
            return EventOutcome::none();
        };

        if !gesture.pointer_moved(position) {
            return EventOutcome::none();
        }

        let kind = gesture.kind;
        let mut outcome = self.recompute(transforms);

        if kind.auto_commits() {
            self.publish_interim(selection);
            outcome.selection_published = true;
        } else if self.settings.notify_during_selection && outcome.mask_changed {
            self.publish_interim(selection);
            outcome.selection_published = true;
        }

        outcome
    }

    /// Primary button release: commit drag gestures. Polygon keeps going
    /// (it finalizes on the secondary button) and sample has already
    /// published on every move.
    pub fn pointer_released(&mut self, selection: &mut LayerSelection) -> EventOutcome {
        let Some(gesture) = &self.gesture else {
            return EventOutcome::none();
        };

        if gesture.kind.multi_click() {
            return EventOutcome::none();
        }

        if gesture.kind.auto_commits() {
            self.clear_gesture();
            return EventOutcome::mask();
        }

        self.commit(selection)
    }

    /// Secondary button press: finalize an in-flight polygon, excluding the
    /// dangling preview vertex that trailed the pointer.
    pub fn finalize_polygon(
        &mut self,
        transforms: &TransformStack,
        selection: &mut LayerSelection,
    ) -> EventOutcome {
        let Some(gesture) = &self.gesture else {
            return EventOutcome::none();
        };

        if !gesture.kind.multi_click() {
            return EventOutcome::none();
        }

        // The preview-inclusive coverage from the last move is stale now;
        // rebuild from the clicked vertices alone. A degenerate vertex list
        // leaves the mask empty, which commits as "select none".
        self.mask.reset();

        let clicked = self.gesture.as_ref().map(|gesture| gesture.trail().to_vec());

        if let Some(points) = clicked {
            if let Err(error) = self.fill_from_screen_polygon(&points, transforms) {
                debug!("polygon finalize produced no coverage: {error}");
            }
        }

        self.commit(selection)
    }

    /// Merge the current coverage into the selection under the gesture's
    /// modifier, publish, and return to idle.
    pub fn commit(&mut self, selection: &mut LayerSelection) -> EventOutcome {
        if self.gesture.is_none() {
            return EventOutcome::none();
        }

        self.publish_interim(selection);
        self.clear_gesture();

        EventOutcome::published()
    }

    /// Drop the gesture and its coverage without publishing anything.
    pub fn abort(&mut self) -> EventOutcome {
        if self.gesture.is_none() {
            return EventOutcome::none();
        }

        self.clear_gesture();

        EventOutcome::mask()
    }

    /// Select every pixel inside the visible viewport under the current
    /// modifier, immediately. Works only between gestures.
    pub fn select_visible_region(
        &mut self,
        transforms: &TransformStack,
        selection: &mut LayerSelection,
    ) -> EventOutcome {
        if self.gesture.is_some() {
            return EventOutcome::none();
        }

        let result = (|| -> Result<(), GestureError> {
            let top_left = self.screen_to_uv(Vec2::ZERO, transforms)?;
            let bottom_right = self.screen_to_uv(transforms.viewport, transforms)?;

            self.mask
                .fill_shape(&CoverageShape::rectangle(top_left, bottom_right))?;
            Ok(())
        })();

        if let Err(error) = result {
            debug!("visible-region selection skipped: {error}");
            return EventOutcome::none();
        }

        let covered = covered_indices(&self.mask, &self.validity);
        let merged = combine(selection.indices(), &covered, self.effective_modifier());

        selection.publish(merged);
        self.mask.reset();

        EventOutcome::published()
    }

    // ---- whole-dataset operations ------------------------------------------

    /// Select every valid pixel. Ignored while a gesture is in flight.
    pub fn select_all(&mut self, selection: &mut LayerSelection) -> EventOutcome {
        if self.gesture.is_some() {
            return EventOutcome::none();
        }

        selection.publish(self.validity.valid_indices().into_iter().collect());

        EventOutcome::published()
    }

    /// Clear the selection. Publishes an empty set; "nothing selected" is a
    /// real notification.
    pub fn select_none(&mut self, selection: &mut LayerSelection) -> EventOutcome {
        if self.gesture.is_some() {
            return EventOutcome::none();
        }

        selection.publish(Default::default());

        EventOutcome::published()
    }

    /// Swap selected and unselected among the valid pixels.
    pub fn invert_selection(&mut self, selection: &mut LayerSelection) -> EventOutcome {
        if self.gesture.is_some() {
            return EventOutcome::none();
        }

        let inverted = self
            .validity
            .valid_indices()
            .into_iter()
            .filter(|index| !selection.contains(*index))
            .collect();

        selection.publish(inverted);

        EventOutcome::published()
    }

    // ---- coverage plumbing -------------------------------------------------

    /// Refresh coverage for the active gesture: an incremental stamp for the
    /// brush, a full recompute for everything else. Per-gesture transform
    /// and geometry failures are logged and leave the mask untouched.
    fn recompute(&mut self, transforms: &TransformStack) -> EventOutcome {
        let Some(gesture) = &self.gesture else {
            return EventOutcome::none();
        };

        let result = match gesture.kind {
            SelectionTool::Brush => self.stamp_brush(transforms),
            _ => self.recompute_full(transforms),
        };

        match result {
            Ok(()) => EventOutcome::mask(),
            Err(error) => {
                debug!("coverage update skipped: {error}");
                EventOutcome::none()
            }
        }
    }

    fn recompute_full(&mut self, transforms: &TransformStack) -> Result<(), GestureError> {
        let gesture = self.gesture.as_ref().expect("gesture active");

        match gesture.kind {
            SelectionTool::Rectangle => {
                let trail = gesture.trail();

                if trail.len() < 2 {
                    return Err(InvalidGeometryError::EmptyTrail.into());
                }

                let a = self.screen_to_uv(trail[0], transforms)?;
                let b = self.screen_to_uv(trail[trail.len() - 1], transforms)?;

                self.mask.fill_shape(&CoverageShape::rectangle(a, b))?;
            }
            SelectionTool::Lasso => {
                let points = gesture.trail().to_vec();
                self.fill_from_screen_polygon(&points, transforms)?;
            }
            SelectionTool::Polygon => {
                let points = gesture.trail_with_preview();
                self.fill_from_screen_polygon(&points, transforms)?;
            }
            SelectionTool::Sample => {
                let position = *gesture
                    .trail()
                    .last()
                    .ok_or(InvalidGeometryError::EmptyTrail)?;
                let point = self.screen_to_uv(position, transforms)?;

                self.mask.fill_shape(&CoverageShape::Sample { point })?;
            }
            SelectionTool::Brush => unreachable!("brush coverage is stamped incrementally"),
        }

        Ok(())
    }

    fn stamp_brush(&mut self, transforms: &TransformStack) -> Result<(), GestureError> {
        let gesture = self.gesture.as_ref().expect("gesture active");
        let (previous, current) = gesture
            .last_segment()
            .ok_or(InvalidGeometryError::DegenerateBrush)?;
        let radius_screen = gesture.brush_radius();

        let from = self.screen_to_image_px(previous, transforms)?;
        let to = self.screen_to_image_px(current, transforms)?;

        let radius_world = transforms.screen_distance_to_world(radius_screen)?;
        let radius = radius_world * self.mask.width() as f32 / self.world_rect.width();

        self.mask.stamp_capsule(from, to, radius)?;

        Ok(())
    }

    fn fill_from_screen_polygon(
        &mut self,
        screen_points: &[Vec2],
        transforms: &TransformStack,
    ) -> Result<(), GestureError> {
        if screen_points.len() < 3 {
            return Err(InvalidGeometryError::DegeneratePolygon.into());
        }

        let points = screen_points
            .iter()
            .map(|point| self.screen_to_uv(*point, transforms))
            .collect::<Result<Vec<Vec2>, GestureError>>()?;

        self.mask.fill_shape(&CoverageShape::Polygon { points })?;

        Ok(())
    }

    fn screen_to_uv(
        &self,
        screen: Vec2,
        transforms: &TransformStack,
    ) -> Result<Vec2, GestureError> {
        if self.world_rect.is_degenerate() {
            return Err(InvalidGeometryError::DegenerateWorldRect.into());
        }

        let world = transforms.screen_to_world(screen)?;

        Ok(self.world_rect.uv(Vec2::new(world.x, world.y)))
    }

    fn screen_to_image_px(
        &self,
        screen: Vec2,
        transforms: &TransformStack,
    ) -> Result<Vec2, GestureError> {
        let uv = self.screen_to_uv(screen, transforms)?;

        Ok(uv * Vec2::new(self.mask.width() as f32, self.mask.height() as f32))
    }

    /// Combine coverage with the current selection and publish, without
    /// ending the gesture.
    fn publish_interim(&mut self, selection: &mut LayerSelection) {
        let modifier = self
            .gesture
            .as_ref()
            .map(|gesture| gesture.modifier)
            .unwrap_or_else(|| self.effective_modifier());

        let covered = covered_indices(&self.mask, &self.validity);
        let merged = combine(selection.indices(), &covered, modifier);

        selection.publish(merged);
    }

    fn clear_gesture(&mut self) {
        self.gesture = None;
        self.mask.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_4x4() -> SelectionSession {
        SelectionSession::new(4, 4, ValidityMask::full(4, 4)).unwrap()
    }

    fn identity_4x4() -> TransformStack {
        TransformStack::fit(Vec2::new(4.0, 4.0), WorldRect::from_image_size(4, 4))
    }

    fn selected(selection: &LayerSelection) -> Vec<u32> {
        let mut indices: Vec<u32> = selection.indices().iter().copied().collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn oversized_mask_is_a_resource_error() {
        // The dimension check runs before the validity buffer is consulted,
        // so no multi-gigabyte allocation is needed to provoke it.
        let result = SelectionSession::new(1 << 16, 1 << 16, ValidityMask::full(1, 1));

        assert!(matches!(result, Err(ResourceInitError::MaskTooLarge { .. })));
    }

    #[test]
    fn mismatched_validity_is_a_resource_error() {
        let result = SelectionSession::new(4, 4, ValidityMask::full(2, 2));

        assert!(matches!(
            result,
            Err(ResourceInitError::ValidityMismatch { .. })
        ));
    }

    #[test]
    fn rectangle_drag_selects_the_covered_block() {
        let mut session = session_4x4();
        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();

        session.pointer_pressed(Vec2::ZERO, &transforms, &mut selection);
        session.pointer_moved(Vec2::new(2.0, 2.0), &transforms, &mut selection);
        let outcome = session.pointer_released(&mut selection);

        assert!(outcome.selection_published);
        assert_eq!(selected(&selection), vec![0, 1, 4, 5]);
        assert_eq!(session.phase(), GesturePhase::Idle);
        assert_eq!(session.mask().covered_count(), 0);
    }

    #[test]
    fn escape_aborts_a_lasso_without_publishing() {
        let mut session = session_4x4();
        session.set_tool(SelectionTool::Lasso);

        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();
        selection.publish([9].into_iter().collect());
        let generation = selection.generation();

        session.pointer_pressed(Vec2::ZERO, &transforms, &mut selection);
        session.pointer_moved(Vec2::new(4.0, 0.0), &transforms, &mut selection);
        session.pointer_moved(Vec2::new(4.0, 4.0), &transforms, &mut selection);

        let outcome = session.handle_event(
            &InputEvent::KeyPressed { key: Key::Escape },
            &transforms,
            &mut selection,
        );

        assert!(outcome.mask_changed);
        assert!(!outcome.selection_published);
        assert_eq!(selection.generation(), generation);
        assert_eq!(session.phase(), GesturePhase::Idle);
    }

    #[test]
    fn shift_overrides_the_modifier_until_released() {
        let mut session = session_4x4();
        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();

        session.handle_event(
            &InputEvent::KeyPressed { key: Key::Shift },
            &transforms,
            &mut selection,
        );
        assert_eq!(session.effective_modifier(), SelectionModifier::Add);

        session.handle_event(
            &InputEvent::KeyReleased { key: Key::Shift },
            &transforms,
            &mut selection,
        );
        assert_eq!(session.effective_modifier(), SelectionModifier::Replace);
    }

    #[test]
    fn wheel_resizes_the_brush_only_while_brush_is_active() {
        let mut session = session_4x4();
        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();

        session.handle_event(
            &InputEvent::Wheel { delta: 1.0 },
            &transforms,
            &mut selection,
        );
        assert_eq!(session.settings().brush_radius, BRUSH_RADIUS_DEFAULT);

        session.set_tool(SelectionTool::Brush);
        session.handle_event(
            &InputEvent::Wheel { delta: 1.0 },
            &transforms,
            &mut selection,
        );
        assert_eq!(
            session.settings().brush_radius,
            BRUSH_RADIUS_DEFAULT + BRUSH_RADIUS_DELTA
        );
    }

    #[test]
    fn tool_switch_is_ignored_mid_gesture() {
        let mut session = session_4x4();
        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();

        session.pointer_pressed(Vec2::ZERO, &transforms, &mut selection);
        session.set_tool(SelectionTool::Brush);

        assert_eq!(session.settings().tool, SelectionTool::Rectangle);

        session.pointer_released(&mut selection);
        session.set_tool(SelectionTool::Brush);

        assert_eq!(session.settings().tool, SelectionTool::Brush);
    }

    #[test]
    fn sample_publishes_on_every_move_without_release() {
        let mut session = session_4x4();
        session.set_tool(SelectionTool::Sample);

        let transforms = identity_4x4();
        let mut selection = LayerSelection::new();

        let outcome = session.pointer_pressed(Vec2::new(0.5, 0.5), &transforms, &mut selection);
        assert!(outcome.selection_published);
        assert_eq!(selected(&selection), vec![0]);

        session.pointer_moved(Vec2::new(2.5, 1.5), &transforms, &mut selection);
        assert_eq!(selected(&selection), vec![6]);

        let outcome = session.pointer_released(&mut selection);
        assert!(!outcome.selection_published);
        assert_eq!(selected(&selection), vec![6]);
    }

    #[test]
    fn invert_swaps_selected_and_unselected_valid_pixels() {
        let validity = ValidityMask::from_raw(2, 2, vec![255, 255, 0, 255]).unwrap();
        let mut session = SelectionSession::new(2, 2, validity).unwrap();
        let mut selection = LayerSelection::new();

        session.select_all(&mut selection);
        assert_eq!(selected(&selection), vec![0, 1, 3]);

        selection.publish([0].into_iter().collect());
        session.invert_selection(&mut selection);
        assert_eq!(selected(&selection), vec![1, 3]);

        session.select_none(&mut selection);
        assert!(selection.is_empty());
    }

    #[test]
    fn visible_region_selection_covers_the_viewport() {
        let mut session = session_4x4();
        // Viewport sees only the left half of the image.
        let transforms = TransformStack::fit(
            Vec2::new(4.0, 8.0),
            WorldRect::new(Vec2::ZERO, Vec2::new(2.0, 4.0)),
        );
        let mut selection = LayerSelection::new();

        let outcome = session.select_visible_region(&transforms, &mut selection);

        assert!(outcome.selection_published);
        assert_eq!(selected(&selection), vec![0, 1, 4, 5, 8, 9, 12, 13]);
    }
}
