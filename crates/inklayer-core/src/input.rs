//! Pointer event model delivered by the host input surface.
//!
//! The engine is input-source agnostic: mouse, touch, and stylus all arrive
//! as the same pointer protocol with device coordinates.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event delivered by the host, in device coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Pressed {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Moved {
        position: Point,
    },
    Released {
        position: Point,
        button: MouseButton,
    },
    WheelChanged {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}
