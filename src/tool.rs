use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::Key;

/// Brush radius bounds and defaults, in screen pixels.
pub const BRUSH_RADIUS_MIN: f32 = 1.0;
pub const BRUSH_RADIUS_MAX: f32 = 10_000.0;
pub const BRUSH_RADIUS_DEFAULT: f32 = 50.0;
/// Radius change applied per wheel notch.
pub const BRUSH_RADIUS_DELTA: f32 = 2.0;

/// Lasso points closer than this (screen pixels) to the previous trail
/// point are dropped to keep freehand outlines from collecting jitter.
const LASSO_MIN_POINT_DISTANCE: f32 = 1.0;

/// The selection tool kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionTool {
    /// Two-corner axis-aligned rectangle.
    #[default]
    Rectangle,
    /// Freehand stroke with a circular tip; coverage accumulates while
    /// the pointer is down.
    Brush,
    /// Freehand outline, implicitly closed.
    Lasso,
    /// Click-placed vertices, finalized with the secondary button.
    Polygon,
    /// Single pixel under the pointer, committed on every move.
    Sample,
}

impl SelectionTool {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionTool::Rectangle => "Rectangle",
            SelectionTool::Brush => "Brush",
            SelectionTool::Lasso => "Lasso",
            SelectionTool::Polygon => "Polygon",
            SelectionTool::Sample => "Sample",
        }
    }

    pub fn all() -> &'static [SelectionTool] {
        &[
            SelectionTool::Rectangle,
            SelectionTool::Brush,
            SelectionTool::Lasso,
            SelectionTool::Polygon,
            SelectionTool::Sample,
        ]
    }

    pub fn from_hotkey(key: Key) -> Option<SelectionTool> {
        match key {
            Key::R => Some(SelectionTool::Rectangle),
            Key::B => Some(SelectionTool::Brush),
            Key::L => Some(SelectionTool::Lasso),
            Key::P => Some(SelectionTool::Polygon),
            Key::S => Some(SelectionTool::Sample),
            _ => None,
        }
    }

    /// Whether the mask accumulates across pointer moves instead of being
    /// recomputed from scratch on each one.
    pub fn accumulates(&self) -> bool {
        matches!(self, SelectionTool::Brush)
    }

    /// Whether every pointer move publishes immediately, with no explicit
    /// release needed.
    pub fn auto_commits(&self) -> bool {
        matches!(self, SelectionTool::Sample)
    }

    /// Whether the gesture spans multiple clicks rather than one drag.
    pub fn multi_click(&self) -> bool {
        matches!(self, SelectionTool::Polygon)
    }

    /// Whether `Escape` aborts an in-flight gesture. Drag tools simply end
    /// at pointer release, so only the long-lived outline gestures need a
    /// distinct abort.
    pub fn abortable(&self) -> bool {
        matches!(self, SelectionTool::Lasso | SelectionTool::Polygon)
    }
}

/// How newly covered pixels merge with the existing selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionModifier {
    /// Discard the existing selection, keep only the covered pixels.
    #[default]
    Replace,
    /// Union with the existing selection.
    Add,
    /// Difference: remove the covered pixels from the existing selection.
    Subtract,
}

impl SelectionModifier {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionModifier::Replace => "Replace",
            SelectionModifier::Add => "Add",
            SelectionModifier::Subtract => "Subtract",
        }
    }

    pub fn all() -> &'static [SelectionModifier] {
        &[
            SelectionModifier::Replace,
            SelectionModifier::Add,
            SelectionModifier::Subtract,
        ]
    }
}

/// Gesture lifecycle. Commit and abort complete synchronously inside
/// [`crate::session::SelectionSession`], so only the two resting phases are
/// ever observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Active,
}

/// The geometric state of one selection gesture: the tool kind, the merge
/// modifier locked in at gesture start, the brush radius, and the pointer
/// trail in screen space.
///
/// The trail is deliberately kept in screen coordinates; conversion to
/// world/texture space happens at rasterization time under whatever
/// transforms are live at that moment.
#[derive(Clone, Debug)]
pub struct ToolState {
    pub kind: SelectionTool,
    pub modifier: SelectionModifier,
    /// Brush tip radius in screen pixels, clamped to
    /// [`BRUSH_RADIUS_MIN`, `BRUSH_RADIUS_MAX`].
    brush_radius: f32,
    trail: Vec<Vec2>,
    /// Tentative polygon vertex tracking the pointer between clicks.
    preview: Option<Vec2>,
}

impl ToolState {
    pub fn new(kind: SelectionTool, modifier: SelectionModifier, brush_radius: f32) -> Self {
        Self {
            kind,
            modifier,
            brush_radius: brush_radius.clamp(BRUSH_RADIUS_MIN, BRUSH_RADIUS_MAX),
            trail: Vec::new(),
            preview: None,
        }
    }

    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    pub fn set_brush_radius(&mut self, radius: f32) {
        self.brush_radius = radius.clamp(BRUSH_RADIUS_MIN, BRUSH_RADIUS_MAX);
    }

    /// Screen-space pointer trail, excluding the polygon preview vertex.
    pub fn trail(&self) -> &[Vec2] {
        &self.trail
    }

    /// Trail plus the tentative preview vertex, for live coverage preview.
    pub fn trail_with_preview(&self) -> Vec<Vec2> {
        let mut points = self.trail.clone();

        if let Some(preview) = self.preview {
            points.push(preview);
        }

        points
    }

    /// Start the gesture at the pressed position.
    pub fn begin_at(&mut self, position: Vec2) {
        self.trail.clear();
        self.preview = None;
        self.trail.push(position);
    }

    /// Append a clicked polygon vertex.
    pub fn add_vertex(&mut self, position: Vec2) {
        self.trail.push(position);
        self.preview = None;
    }

    /// Fold a pointer move into the trail. Returns whether the descriptor
    /// changed (and coverage therefore needs recomputing).
    pub fn pointer_moved(&mut self, position: Vec2) -> bool {
        match self.kind {
            SelectionTool::Rectangle => {
                // Keep exactly the anchor corner and the current corner.
                if self.trail.len() < 2 {
                    self.trail.push(position);
                } else {
                    self.trail[1] = position;
                }
                true
            }
            SelectionTool::Brush => {
                self.trail.push(position);
                true
            }
            SelectionTool::Lasso => {
                let moved_enough = self
                    .trail
                    .last()
                    .is_none_or(|last| last.distance(position) >= LASSO_MIN_POINT_DISTANCE);

                if moved_enough {
                    self.trail.push(position);
                }
                moved_enough
            }
            SelectionTool::Polygon => {
                self.preview = Some(position);
                true
            }
            SelectionTool::Sample => {
                self.trail.clear();
                self.trail.push(position);
                true
            }
        }
    }

    /// The last stroke segment for incremental brush stamping. A single
    /// recorded position yields a degenerate segment (a single dab).
    pub fn last_segment(&self) -> Option<(Vec2, Vec2)> {
        let current = *self.trail.last()?;
        let previous = if self.trail.len() > 1 {
            self.trail[self.trail.len() - 2]
        } else {
            current
        };

        Some((previous, current))
    }
}
