//! Pixel-selection engine for raster layers viewed under pan/zoom
//! transforms.
//!
//! The crate turns pointer gestures (rectangle, brush, lasso, polygon,
//! single-sample) into a per-layer coverage mask and merges that mask into a
//! dataset-owned set of selected pixel indices under a replace/add/subtract
//! modifier. It owns no rendering and no windowing; the host feeds it
//! [`input::InputEvent`]s together with its live [`transform::TransformStack`]
//! and reads back the coverage mask and the published selection.
//!
//! ```
//! use glam::Vec2;
//! use marquee::input::{InputEvent, PointerButtons};
//! use marquee::selection::{LayerSelection, ValidityMask};
//! use marquee::session::SelectionSession;
//! use marquee::transform::{TransformStack, WorldRect};
//!
//! let mut session = SelectionSession::new(4, 4, ValidityMask::full(4, 4)).unwrap();
//! let transforms = TransformStack::fit(Vec2::new(4.0, 4.0), WorldRect::from_image_size(4, 4));
//! let mut selection = LayerSelection::new();
//!
//! for event in [
//!     InputEvent::PointerPressed { position: Vec2::ZERO, buttons: PointerButtons::PRIMARY },
//!     InputEvent::PointerMoved { position: Vec2::new(2.0, 2.0), buttons: PointerButtons::PRIMARY },
//!     InputEvent::PointerReleased { position: Vec2::new(2.0, 2.0), buttons: PointerButtons::empty() },
//! ] {
//!     session.handle_event(&event, &transforms, &mut selection);
//! }
//!
//! // The drag covered the top-left 2x2 pixel block.
//! assert_eq!(selection.len(), 4);
//! assert!(selection.contains(0) && selection.contains(5));
//! ```

pub mod input;
pub mod navigate;
pub mod raster;
pub mod selection;
pub mod session;
pub mod tool;
pub mod transform;

pub use input::{InputEvent, Key, PointerButtons};
pub use navigate::Navigator;
pub use raster::{CoverageMask, CoverageShape, InvalidGeometryError, coverage_test};
pub use selection::{LayerSelection, SelectionBounds, ValidityMask};
pub use session::{EventOutcome, ResourceInitError, SelectionSession, SessionSettings};
pub use tool::{GesturePhase, SelectionModifier, SelectionTool};
pub use transform::{TransformError, TransformStack, WorldRect};
