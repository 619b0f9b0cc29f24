//! Interaction layer: pointer events, palette, and the per-tool state
//! machines that turn gestures into recorded actions.

pub mod colors;
pub mod tools;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Which pointer button an event belongs to. Primary/secondary map onto the
/// two palette slots; any further button carries no color and cannot draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// One pointer event in canvas coordinates. `time_ms` is a caller-supplied
/// millisecond timestamp (any monotonic base) used for gesture timing.
#[derive(Clone, Copy, Debug)]
pub struct PointerEvent {
    pub pos: Point,
    pub button: PointerButton,
    pub time_ms: u64,
}

impl PointerEvent {
    pub fn new(x: i32, y: i32, button: PointerButton, time_ms: u64) -> Self {
        Self {
            pos: Point::new(x, y),
            button,
            time_ms,
        }
    }
}
