//! The editor facade: wires the pointer-event stream into the active tool,
//! tracks the dirty view region, and forwards menu-level operations
//! (effects, transforms, undo/redo, zoom) to the canvas.

use image::RgbaImage;
use log::debug;

use crate::canvas::{Canvas, RenderMode, Surface};
use crate::components::colors::{ColorSlot, Palette};
use crate::components::tools::{Tool, ToolKind, ToolOptions, tool_for};
use crate::components::{PointerButton, PointerEvent};
use crate::geometry::{Point, Rect};
use crate::ops::Action;
use crate::ops::effects::EffectAction;
use crate::ops::transform::{ResizeAction, TransformAction};

/// Owns the canvas, palette, tool options, and the currently selected tool,
/// and exposes the surface a host shell drives: pointer callbacks in, a
/// renderable image and a dirty region out.
pub struct Editor {
    canvas: Canvas,
    palette: Palette,
    options: ToolOptions,
    tool: Box<dyn Tool>,
    tool_kind: ToolKind,
    /// Pending repaint region in view coordinates.
    dirty: Option<Rect>,
}

impl Editor {
    pub fn new(raster: Surface) -> Self {
        Self {
            canvas: Canvas::new(raster),
            palette: Palette::default(),
            options: ToolOptions::default(),
            tool: tool_for(ToolKind::Line),
            tool_kind: ToolKind::Line,
            dirty: None,
        }
    }

    /// Fresh white canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(Surface::filled(width, height, [255, 255, 255, 255]))
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Tool configuration, normally mutated by option panels.
    pub fn options_mut(&mut self) -> &mut ToolOptions {
        &mut self.options
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool_kind
    }

    // ---- input stream ------------------------------------------------------

    pub fn on_pointer_down(&mut self, x: i32, y: i32, button: PointerButton, time_ms: u64) {
        let ev = PointerEvent::new(x, y, button, time_ms);
        let before = self.snapshot();
        let dirty = self
            .tool
            .press(&mut self.canvas, &self.palette, &self.options, &ev);
        self.absorb(before, dirty);
    }

    /// Pointer motion, with or without buttons held; tools that are not
    /// armed ignore it.
    pub fn on_pointer_move(&mut self, x: i32, y: i32, time_ms: u64) {
        let ev = PointerEvent::new(x, y, PointerButton::Primary, time_ms);
        let before = self.snapshot();
        let dirty = self.tool.drag(&mut self.canvas, &ev);
        self.absorb(before, dirty);
    }

    pub fn on_pointer_up(&mut self, x: i32, y: i32, button: PointerButton, time_ms: u64) {
        let ev = PointerEvent::new(x, y, button, time_ms);
        let before = self.snapshot();
        let dirty = self.tool.release(&mut self.canvas, &ev);
        self.absorb(before, dirty);
    }

    /// Switch tools, first letting the old tool commit whatever it has in
    /// flight — tools are mutually exclusive.
    pub fn on_tool_selected(&mut self, kind: ToolKind) {
        let before = self.snapshot();
        self.tool.finish(&mut self.canvas);
        self.absorb(before, None);
        self.tool = tool_for(kind);
        self.tool_kind = kind;
        debug!("tool selected: {:?}", kind);
    }

    pub fn on_color_selected(&mut self, slot: ColorSlot, color: [u8; 4]) {
        self.palette.set_color(slot, color);
    }

    // ---- menu-level operations ---------------------------------------------

    /// Commit an effect over the whole canvas.
    pub fn apply_effect(&mut self, effect: EffectAction) {
        self.canvas.commit(Action::Effect(effect));
        self.mark_all_dirty();
    }

    /// Commit a geometric transform of the whole canvas.
    pub fn apply_transform(&mut self, transform: TransformAction) {
        self.canvas.commit(Action::Transform(transform));
        self.mark_all_dirty();
    }

    /// Record a canvas resize; draws after it are confined to the new size.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas
            .commit(Action::Resize(ResizeAction { width, height }));
        self.mark_all_dirty();
    }

    pub fn undo(&mut self) -> bool {
        let done = self.canvas.undo();
        if done {
            self.mark_all_dirty();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.canvas.redo();
        if done {
            self.mark_all_dirty();
        }
        done
    }

    pub fn can_undo(&self) -> bool {
        self.canvas.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.canvas.can_redo()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.canvas.has_unsaved_changes()
    }

    /// Replace the base raster (a newly opened file). The log starts over.
    pub fn set_image(&mut self, raster: Surface) {
        self.canvas.set_image(raster);
        self.mark_all_dirty();
    }

    pub fn zoom_in(&mut self) {
        self.canvas.zoom_in();
        self.mark_all_dirty();
    }

    pub fn zoom_out(&mut self) {
        self.canvas.zoom_out();
        self.mark_all_dirty();
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.canvas.set_grid_visible(visible);
        self.mark_all_dirty();
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.canvas.set_render_mode(mode);
        self.mark_all_dirty();
    }

    // ---- output ------------------------------------------------------------

    /// The flattened composite (base + committed log, no in-progress
    /// action): what gets saved.
    pub fn composite(&self) -> RgbaImage {
        self.canvas.composite().into_image()
    }

    /// The full display image for the current mode/zoom/grid.
    pub fn render(&self) -> RgbaImage {
        self.canvas.render()
    }

    /// Composite color under a canvas point, for color picking.
    pub fn color_at(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.canvas.color_at(Point::new(x, y)).map(|c| c.0)
    }

    /// View region needing repaint since the last call, if any. Consumed.
    pub fn take_dirty_region(&mut self) -> Option<Rect> {
        self.dirty.take()
    }

    // ---- dirty tracking ----------------------------------------------------

    fn snapshot(&self) -> (usize, bool) {
        (self.canvas.undo_depth(), self.canvas.active().is_some())
    }

    /// Fold a tool's reported region into the pending repaint. A log-depth
    /// change (commit) or a discarded in-progress action both invalidate the
    /// whole view.
    fn absorb(&mut self, before: (usize, bool), dirty: Option<Rect>) {
        let (depth, had_active) = before;
        if self.canvas.undo_depth() != depth || (had_active && self.canvas.active().is_none()) {
            self.mark_all_dirty();
            return;
        }
        if let Some(r) = dirty {
            self.mark_canvas_dirty(r);
        }
    }

    fn mark_all_dirty(&mut self) {
        let (vw, vh) = self.canvas.render_size();
        self.dirty = Some(Rect::new(0, 0, vw.max(1) as i32 - 1, vh.max(1) as i32 - 1));
    }

    /// Scale a canvas-space region to view space. Tiled and scaled modes
    /// repeat the canvas, so any change touches the whole viewport.
    fn mark_canvas_dirty(&mut self, r: Rect) {
        match self.canvas.render_mode() {
            RenderMode::Normal => {
                let scaled = r.scaled(self.canvas.zoom());
                self.dirty = Some(match self.dirty {
                    Some(d) => d.union(scaled),
                    None => scaled,
                });
            }
            RenderMode::Tiled | RenderMode::Scaled => self.mark_all_dirty(),
        }
    }
}
