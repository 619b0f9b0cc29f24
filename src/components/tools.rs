//! Per-tool interaction logic.
//!
//! Each tool is a small state machine over pointer events: idle until a
//! valid press arms it and parks an in-progress action in the canvas's
//! active slot, then drags mutate that action's live geometry, and a release
//! (or an explicit finish) commits it to the log — or a press with a
//! different button cancels it. The tool itself only keeps bookkeeping; the
//! action lives in the canvas so exactly one owner can hand it over to the
//! log.
//!
//! Methods return the canvas-space rect whose pixels changed, so the host
//! can repaint a region instead of the whole view.

use log::trace;

use crate::canvas::Canvas;
use crate::components::colors::Palette;
use crate::components::{PointerButton, PointerEvent};
use crate::geometry::{Point, Rect};
use crate::ops::Action;
use crate::ops::fill::FillAction;
use crate::ops::gradient::{GradientAction, GradientKind};
use crate::ops::shapes::{OvalAction, RectAction};
use crate::ops::strokes::{LineAction, StrokeAction};
use crate::ops::text::{FontHandle, HAlign, TextAction, VAlign};

/// A release earlier than this after the press does not commit: it is the
/// accidental click of a user who meant to start a drag, not a deliberate
/// zero-size shape.
pub const MIN_DWELL_MS: u64 = 200;

/// The selectable tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    Pencil,
    Line,
    Rect,
    Oval,
    Gradient,
    Text,
    Fill,
}

/// How two-corner shapes use the palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShapeStyle {
    /// Outline in the pressed button's color.
    #[default]
    Outline,
    /// Solid interior in the pressed button's color.
    Filled,
    /// Outline in the pressed color, interior in the other well's color.
    Both,
}

/// Tool configuration normally fed by toolbars and option panels.
#[derive(Clone, Debug)]
pub struct ToolOptions {
    pub stroke_width: u32,
    pub shape_style: ShapeStyle,
    pub gradient_kind: GradientKind,
    /// Two-tone fills: border in the pressed color, interior in the other.
    pub fill_two_tone: bool,
    /// Carried into the fill; tolerance is not implemented (exact match).
    pub fill_threshold: u8,
    pub font: Option<FontHandle>,
    pub font_size: f32,
    pub text: String,
    pub halign: HAlign,
    pub valign: VAlign,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            stroke_width: 1,
            shape_style: ShapeStyle::Outline,
            gradient_kind: GradientKind::Linear,
            fill_two_tone: false,
            fill_threshold: 0,
            font: None,
            font_size: 16.0,
            text: String::new(),
            halign: HAlign::Left,
            valign: VAlign::Top,
        }
    }
}

/// A tool's view of the pointer stream. All methods return the canvas-space
/// region to repaint, when a cheap bound is known; commits are detected by
/// the caller through the log depth and repaint everything.
pub trait Tool {
    fn press(
        &mut self,
        canvas: &mut Canvas,
        palette: &Palette,
        opts: &ToolOptions,
        ev: &PointerEvent,
    ) -> Option<Rect>;

    fn drag(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect>;

    fn release(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect>;

    /// Commit the in-progress action, if any. Also invoked when the user
    /// switches tools mid-gesture.
    fn finish(&mut self, canvas: &mut Canvas) -> bool;

    /// Drop the in-progress action, if any.
    fn cancel(&mut self, canvas: &mut Canvas);
}

/// Instantiate the state machine for a tool kind.
pub fn tool_for(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Pencil => Box::new(PencilTool::default()),
        ToolKind::Line => Box::new(ShapeTool::new(ShapeKind::Line)),
        ToolKind::Rect => Box::new(ShapeTool::new(ShapeKind::Rect)),
        ToolKind::Oval => Box::new(ShapeTool::new(ShapeKind::Oval)),
        ToolKind::Gradient => Box::new(ShapeTool::new(ShapeKind::Gradient)),
        ToolKind::Text => Box::new(TextTool::default()),
        ToolKind::Fill => Box::new(FillTool::default()),
    }
}

/// Pointer position inside the image?
fn in_bounds(canvas: &Canvas, p: Point) -> bool {
    p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height()
}

// ============================================================================
// PENCIL — freehand stroke
// ============================================================================

#[derive(Default)]
pub struct PencilTool {
    armed: bool,
}

impl Tool for PencilTool {
    fn press(
        &mut self,
        canvas: &mut Canvas,
        palette: &Palette,
        _opts: &ToolOptions,
        ev: &PointerEvent,
    ) -> Option<Rect> {
        if self.armed {
            // a second press mid-stroke rejects the gesture
            self.cancel(canvas);
            return None;
        }
        let color = palette.for_button(ev.button)?;
        if !in_bounds(canvas, ev.pos) {
            return None;
        }
        canvas.set_active(Action::Stroke(StrokeAction::new(ev.pos, color)));
        self.armed = true;
        trace!("pencil armed at {:?}", ev.pos);
        Some(Rect::at(ev.pos))
    }

    fn drag(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect> {
        if !self.armed || !in_bounds(canvas, ev.pos) {
            return None;
        }
        let Some(Action::Stroke(stroke)) = canvas.active_mut() else {
            return None;
        };
        let prev = stroke.last_point();
        stroke.add(ev.pos);
        Some(Rect::spanning(prev, ev.pos))
    }

    fn release(&mut self, canvas: &mut Canvas, _ev: &PointerEvent) -> Option<Rect> {
        self.finish(canvas);
        None
    }

    fn finish(&mut self, canvas: &mut Canvas) -> bool {
        self.armed = false;
        canvas.commit_active()
    }

    fn cancel(&mut self, canvas: &mut Canvas) {
        self.armed = false;
        canvas.cancel_active();
    }
}

// ============================================================================
// TWO-CORNER SHAPES — line, rect, oval, gradient
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShapeKind {
    Line,
    Rect,
    Oval,
    Gradient,
}

#[derive(Clone, Copy)]
struct Armed {
    button: PointerButton,
    pressed_at_ms: u64,
    width_pad: i32,
}

/// Shared state machine for every press-drag-release shape. The press pins
/// the first corner, drags move the second, and the release commits —
/// guarded by [`MIN_DWELL_MS`] so a stray click does not commit a degenerate
/// shape. While armed, a press of the *same* button commits and a press of
/// any other button cancels.
pub struct ShapeTool {
    kind: ShapeKind,
    armed: Option<Armed>,
}

impl ShapeTool {
    fn new(kind: ShapeKind) -> Self {
        Self { kind, armed: None }
    }

    fn build(
        &self,
        palette: &Palette,
        opts: &ToolOptions,
        p: Point,
        button: PointerButton,
    ) -> Option<Action> {
        let color = palette.for_button(button)?;
        let other = palette.opposite(button);
        Some(match self.kind {
            ShapeKind::Line => Action::Line(LineAction::new(p, color, opts.stroke_width)),
            ShapeKind::Rect => {
                let (outline, fill) = shape_colors(opts.shape_style, color, other);
                Action::Rect(RectAction::new(p, outline, fill))
            }
            ShapeKind::Oval => {
                let (outline, fill) = shape_colors(opts.shape_style, color, other);
                Action::Oval(OvalAction::new(p, outline, fill))
            }
            ShapeKind::Gradient => Action::Gradient(GradientAction::new(
                p,
                color,
                other.unwrap_or(color),
                opts.gradient_kind,
            )),
        })
    }
}

fn shape_colors(
    style: ShapeStyle,
    pressed: [u8; 4],
    other: Option<[u8; 4]>,
) -> (Option<[u8; 4]>, Option<[u8; 4]>) {
    match style {
        ShapeStyle::Outline => (Some(pressed), None),
        ShapeStyle::Filled => (None, Some(pressed)),
        ShapeStyle::Both => (Some(pressed), other.or(Some(pressed))),
    }
}

/// The shape's second corner, if an action of this tool is active.
fn second_corner(action: &Action) -> Option<Point> {
    match action {
        Action::Line(a) => Some(a.p2),
        Action::Rect(a) => Some(a.p2),
        Action::Oval(a) => Some(a.p2),
        Action::Gradient(a) => Some(a.p2),
        _ => None,
    }
}

fn set_second_corner(action: &mut Action, p: Point) {
    match action {
        Action::Line(a) => a.p2 = p,
        Action::Rect(a) => a.p2 = p,
        Action::Oval(a) => a.p2 = p,
        Action::Gradient(a) => a.p2 = p,
        _ => {}
    }
}

fn first_corner(action: &Action) -> Option<Point> {
    match action {
        Action::Line(a) => Some(a.p1),
        Action::Rect(a) => Some(a.p1),
        Action::Oval(a) => Some(a.p1),
        Action::Gradient(a) => Some(a.p1),
        _ => None,
    }
}

impl Tool for ShapeTool {
    fn press(
        &mut self,
        canvas: &mut Canvas,
        palette: &Palette,
        opts: &ToolOptions,
        ev: &PointerEvent,
    ) -> Option<Rect> {
        if let Some(armed) = self.armed {
            if ev.button == armed.button {
                self.finish(canvas);
            } else {
                self.cancel(canvas);
            }
            return None;
        }
        if !in_bounds(canvas, ev.pos) {
            return None;
        }
        let action = self.build(palette, opts, ev.pos, ev.button)?;
        canvas.set_active(action);
        self.armed = Some(Armed {
            button: ev.button,
            pressed_at_ms: ev.time_ms,
            width_pad: (opts.stroke_width / 2 + 1) as i32,
        });
        trace!("{:?} tool armed at {:?}", self.kind, ev.pos);
        Some(Rect::at(ev.pos))
    }

    fn drag(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect> {
        let armed = self.armed?;
        let pad = armed.width_pad;
        let kind = self.kind;
        let action = canvas.active_mut()?;
        let old = second_corner(action)?;
        if old == ev.pos {
            return None;
        }
        set_second_corner(action, ev.pos);
        if kind == ShapeKind::Gradient {
            // a gradient repaints the whole canvas, not just its gesture box
            return Some(Rect::new(
                0,
                0,
                canvas.width() as i32 - 1,
                canvas.height() as i32 - 1,
            ));
        }
        let p1 = first_corner(canvas.active()?)?;
        Some(Rect::spanning(p1, old).include(ev.pos).padded(pad))
    }

    fn release(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect> {
        let armed = self.armed?;
        if ev.time_ms.saturating_sub(armed.pressed_at_ms) < MIN_DWELL_MS {
            // too fast to be a deliberate shape; stay armed
            return None;
        }
        if let Some(action) = canvas.active_mut() {
            set_second_corner(action, ev.pos);
        }
        self.finish(canvas);
        None
    }

    fn finish(&mut self, canvas: &mut Canvas) -> bool {
        self.armed = None;
        canvas.commit_active()
    }

    fn cancel(&mut self, canvas: &mut Canvas) {
        self.armed = None;
        canvas.cancel_active();
    }
}

// ============================================================================
// TEXT
// ============================================================================

#[derive(Default)]
pub struct TextTool {
    armed: bool,
}

impl Tool for TextTool {
    fn press(
        &mut self,
        canvas: &mut Canvas,
        palette: &Palette,
        opts: &ToolOptions,
        ev: &PointerEvent,
    ) -> Option<Rect> {
        if self.armed {
            self.cancel(canvas);
            return None;
        }
        let color = palette.for_button(ev.button)?;
        let font = opts.font.clone()?;
        if opts.text.is_empty() || !in_bounds(canvas, ev.pos) {
            return None;
        }
        let action = TextAction {
            anchor: ev.pos,
            color,
            text: opts.text.clone(),
            font,
            size: opts.font_size,
            halign: opts.halign,
            valign: opts.valign,
        };
        let dirty = action.bounds();
        canvas.set_active(Action::Text(action));
        self.armed = true;
        Some(dirty)
    }

    fn drag(&mut self, canvas: &mut Canvas, ev: &PointerEvent) -> Option<Rect> {
        if !self.armed {
            return None;
        }
        let Some(Action::Text(text)) = canvas.active_mut() else {
            return None;
        };
        if text.anchor == ev.pos {
            return None;
        }
        let old = text.bounds();
        text.anchor = ev.pos;
        let new = text.bounds();
        Some(old.union(new))
    }

    fn release(&mut self, canvas: &mut Canvas, _ev: &PointerEvent) -> Option<Rect> {
        self.finish(canvas);
        None
    }

    fn finish(&mut self, canvas: &mut Canvas) -> bool {
        self.armed = false;
        canvas.commit_active()
    }

    fn cancel(&mut self, canvas: &mut Canvas) {
        self.armed = false;
        canvas.cancel_active();
    }
}

// ============================================================================
// FILL
// ============================================================================

#[derive(Default)]
pub struct FillTool {
    armed: bool,
}

impl Tool for FillTool {
    fn press(
        &mut self,
        canvas: &mut Canvas,
        palette: &Palette,
        opts: &ToolOptions,
        ev: &PointerEvent,
    ) -> Option<Rect> {
        if self.armed {
            self.cancel(canvas);
            return None;
        }
        let border = palette.for_button(ev.button)?;
        if !in_bounds(canvas, ev.pos) {
            return None;
        }
        let interior = if opts.fill_two_tone {
            palette.opposite(ev.button).unwrap_or(border)
        } else {
            border
        };
        // the fill's source is the composite at this instant, frozen
        let action = FillAction::new(
            canvas.composite(),
            ev.pos,
            border,
            interior,
            opts.fill_threshold,
            canvas.wrap(),
        );
        let dirty = action.bounds();
        canvas.set_active(Action::Fill(action));
        self.armed = true;
        dirty
    }

    fn drag(&mut self, _canvas: &mut Canvas, _ev: &PointerEvent) -> Option<Rect> {
        None
    }

    fn release(&mut self, canvas: &mut Canvas, _ev: &PointerEvent) -> Option<Rect> {
        self.finish(canvas);
        None
    }

    fn finish(&mut self, canvas: &mut Canvas) -> bool {
        self.armed = false;
        canvas.commit_active()
    }

    fn cancel(&mut self, canvas: &mut Canvas) {
        self.armed = false;
        canvas.cancel_active();
    }
}
