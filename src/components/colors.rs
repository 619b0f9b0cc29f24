use serde::{Deserialize, Serialize};

use crate::components::PointerButton;

/// The two selectable color wells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSlot {
    Primary,
    Secondary,
}

/// Current drawing colors, one per pointer button.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Palette {
    primary: [u8; 4],
    secondary: [u8; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: [0, 0, 0, 255],
            secondary: [255, 255, 255, 255],
        }
    }
}

impl Palette {
    pub fn color(&self, slot: ColorSlot) -> [u8; 4] {
        match slot {
            ColorSlot::Primary => self.primary,
            ColorSlot::Secondary => self.secondary,
        }
    }

    pub fn set_color(&mut self, slot: ColorSlot, color: [u8; 4]) {
        match slot {
            ColorSlot::Primary => self.primary = color,
            ColorSlot::Secondary => self.secondary = color,
        }
    }

    /// Color drawn by `button`, or None for a button with no well — pressing
    /// such a button still fires events but cannot start a drawing gesture.
    pub fn for_button(&self, button: PointerButton) -> Option<[u8; 4]> {
        match button {
            PointerButton::Primary => Some(self.primary),
            PointerButton::Secondary => Some(self.secondary),
            PointerButton::Middle => None,
        }
    }

    /// The other well's color: the infill for two-color shapes.
    pub fn opposite(&self, button: PointerButton) -> Option<[u8; 4]> {
        match button {
            PointerButton::Primary => Some(self.secondary),
            PointerButton::Secondary => Some(self.primary),
            PointerButton::Middle => None,
        }
    }
}
