//! Input contract between the host's windowing layer and the selection
//! engine. The host translates its native pointer/keyboard/wheel events into
//! these types and feeds them to [`crate::session::SelectionSession`].

use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Mouse button state carried by every pointer event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PointerButtons: u8 {
        /// The left (selection) button.
        const PRIMARY = 1;
        /// The right (polygon-finalize / context) button.
        const SECONDARY = 1 << 1;
    }
}

/// The subset of keys the selection engine reacts to.
///
/// `R`/`B`/`L`/`P`/`S` switch the active tool (rectangle, brush, lasso,
/// polygon, sample). `Shift`/`Control` transiently override the selection
/// modifier while held. `Escape` aborts an in-flight lasso or polygon
/// gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Shift,
    Control,
    R,
    B,
    L,
    P,
    S,
}

/// A single host input event. Positions are screen pixels, origin top-left,
/// y pointing down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerPressed { position: Vec2, buttons: PointerButtons },
    PointerMoved { position: Vec2, buttons: PointerButtons },
    PointerReleased { position: Vec2, buttons: PointerButtons },
    /// Vertical wheel movement; positive is away from the user.
    Wheel { delta: f32 },
    KeyPressed { key: Key },
    KeyReleased { key: Key },
}
