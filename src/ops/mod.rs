//! Recorded drawing operations.
//!
//! Every unit of drawing work is one [`Action`]: created by a tool (or
//! committed directly, for effects and transforms), mutable while it is the
//! canvas's in-progress action, and frozen once committed to the log. An
//! action paints purely from its recorded parameters, so replaying the log
//! over the same base always reproduces the same pixels.

pub mod effects;
pub mod fill;
pub mod flood;
pub mod gradient;
pub mod shapes;
pub mod strokes;
pub mod text;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::canvas::Surface;

use effects::EffectAction;
use fill::FillAction;
use gradient::GradientAction;
use shapes::{OvalAction, RectAction};
use strokes::{LineAction, StrokeAction};
use text::TextAction;
use transform::{ResizeAction, TransformAction};

/// The closed set of recordable operations.
#[derive(Clone, Serialize, Deserialize)]
pub enum Action {
    Stroke(StrokeAction),
    Line(LineAction),
    Rect(RectAction),
    Oval(OvalAction),
    Gradient(GradientAction),
    Text(TextAction),
    Fill(FillAction),
    Resize(ResizeAction),
    Effect(EffectAction),
    Transform(TransformAction),
}

impl Action {
    /// True when this action captured-and-replaced the composite beneath it
    /// instead of drawing additively. The replay engine keys two behaviors
    /// off this: such an action is handed the composite-so-far while
    /// painting, and the base raster is no longer layered beneath the cache
    /// once one of them is in the log.
    pub fn copies_raster(&self) -> bool {
        match self {
            Action::Fill(_) => true,
            Action::Effect(e) => e.copies_raster(),
            Action::Transform(_) => true,
            _ => false,
        }
    }

    /// Draw onto `dst`. `composite` is the composite as it stood beneath
    /// this action; the replay engine passes it exactly when
    /// [`Action::copies_raster`] is true, and additive actions never look
    /// at it. (`Fill` carries its own snapshot instead — taken when the
    /// gesture happened, not at replay time.)
    pub fn paint(&self, dst: &mut Surface, composite: Option<&Surface>) {
        match self {
            Action::Stroke(a) => a.paint(dst),
            Action::Line(a) => a.paint(dst),
            Action::Rect(a) => a.paint(dst),
            Action::Oval(a) => a.paint(dst),
            Action::Gradient(a) => a.paint(dst),
            Action::Text(a) => a.paint(dst),
            Action::Fill(a) => a.paint(dst),
            Action::Resize(a) => a.paint(dst),
            Action::Effect(a) => a.paint(dst, composite),
            Action::Transform(a) => a.paint(dst, composite),
        }
    }
}
