use image::{Rgba, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::geometry::Point;
use crate::ops::Action;
use crate::ops::flood::Wrap;

// ============================================================================
// SURFACE — owned RGBA pixel buffer
// ============================================================================

/// Source-over blend of `src` onto `dst` (straight alpha, 8-bit channels).
#[inline]
pub(crate) fn blend_px(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 {
        return src;
    }
    if src[3] == 0 {
        return dst;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let ch = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        ch(src[0], dst[0]),
        ch(src[1], dst[1]),
        ch(src[2], dst[2]),
        (oa * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// An owned 2D RGBA buffer. Dimensions are fixed at creation; a freshly
/// created surface is fully transparent.
///
/// An optional draw-clip `(w, h)` confines all writes that go through
/// [`Surface::set`] / [`Surface::blend`] / [`Surface::blit`] /
/// [`Surface::overwrite`] to the top-left `w`×`h` region. Reads are never
/// clipped. The clip is how a recorded canvas resize constrains everything
/// replayed after it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "RawSurface", try_from = "RawSurface")]
pub struct Surface {
    pixels: RgbaImage,
    clip: Option<(u32, u32)>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            clip: None,
        }
    }

    /// Surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut s = Self::new(width, height);
        for px in s.pixels.pixels_mut() {
            *px = Rgba(color);
        }
        s
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels, clip: None }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Read one pixel. Out-of-range coordinates are a caller bug and panic.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// Overwrite one pixel (no blending). Out-of-range coordinates are a
    /// caller bug and panic; writes outside the active clip are dropped.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        assert!(x < self.width() && y < self.height());
        if self.in_clip(x, y) {
            self.pixels.put_pixel(x, y, color);
        }
    }

    /// Source-over one pixel. This is the lenient rasterization entry point:
    /// coordinates outside the surface (or outside the clip) are dropped, so
    /// geometry may hang off the canvas edge freely.
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width() || y >= self.height() || !self.in_clip(x, y) {
            return;
        }
        let dst = *self.pixels.get_pixel(x, y);
        self.pixels.put_pixel(x, y, blend_px(dst, color));
    }

    /// Source-over blit of `src` at offset `(ox, oy)`, clipped to this
    /// surface's bounds and draw-clip. Negative offsets are fine.
    pub fn blit(&mut self, src: &Surface, ox: i32, oy: i32) {
        let (cw, ch) = self.clip_extent();
        for sy in 0..src.height() {
            let dy = oy + sy as i32;
            if dy < 0 {
                continue;
            }
            if dy as u32 >= ch {
                break;
            }
            for sx in 0..src.width() {
                let dx = ox + sx as i32;
                if dx < 0 {
                    continue;
                }
                if dx as u32 >= cw {
                    break;
                }
                let s = src.get(sx, sy);
                if s[3] == 0 {
                    continue;
                }
                let d = *self.pixels.get_pixel(dx as u32, dy as u32);
                self.pixels.put_pixel(dx as u32, dy as u32, blend_px(d, s));
            }
        }
    }

    /// Reset every pixel to transparent. Ignores the clip — this is a whole
    /// buffer reset, not a draw.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Replace the clipped region with `img` (same dimensions as the surface),
    /// clearing it first. Pixels outside the clip keep their content. Used by
    /// whole-canvas effects that recompute their output to the side.
    pub fn overwrite(&mut self, img: &RgbaImage) {
        debug_assert_eq!((img.width(), img.height()), (self.width(), self.height()));
        match self.clip {
            None => {
                let raw: &mut [u8] = &mut self.pixels;
                raw.copy_from_slice(img.as_raw());
            }
            Some(_) => {
                let (cw, ch) = self.clip_extent();
                for y in 0..ch {
                    for x in 0..cw {
                        self.pixels.put_pixel(x, y, *img.get_pixel(x, y));
                    }
                }
            }
        }
    }

    /// Restrict subsequent draws to the top-left `w`×`h` region.
    pub fn set_clip(&mut self, w: u32, h: u32) {
        self.clip = Some((w, h));
    }

    pub fn clip(&self) -> Option<(u32, u32)> {
        self.clip
    }

    /// Effective drawable extent: surface dimensions limited by the clip.
    #[inline]
    pub fn clip_extent(&self) -> (u32, u32) {
        match self.clip {
            Some((w, h)) => (w.min(self.width()), h.min(self.height())),
            None => (self.width(), self.height()),
        }
    }

    #[inline]
    fn in_clip(&self, x: u32, y: u32) -> bool {
        match self.clip {
            Some((w, h)) => x < w && y < h,
            None => true,
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Raw mutable pixel bytes for row-parallel passes. Callers are
    /// responsible for honoring [`Surface::clip_extent`] themselves.
    pub(crate) fn raw_pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

/// Wire form of a surface: dimensions + raw bytes. Pixel buffers serialize
/// through this shape rather than through any `image` internals.
#[derive(Serialize, Deserialize)]
struct RawSurface {
    width: u32,
    height: u32,
    clip: Option<(u32, u32)>,
    pixels: Vec<u8>,
}

impl From<Surface> for RawSurface {
    fn from(s: Surface) -> Self {
        let clip = s.clip;
        let (width, height) = (s.width(), s.height());
        Self {
            width,
            height,
            clip,
            pixels: s.pixels.into_raw(),
        }
    }
}

impl TryFrom<RawSurface> for Surface {
    type Error = String;

    fn try_from(raw: RawSurface) -> Result<Self, Self::Error> {
        let pixels = RgbaImage::from_raw(raw.width, raw.height, raw.pixels)
            .ok_or_else(|| "pixel data does not match surface dimensions".to_string())?;
        Ok(Self {
            pixels,
            clip: raw.clip,
        })
    }
}

// ============================================================================
// CANVAS — base raster + replayable action log + derived cache
// ============================================================================

/// How the canvas is presented by [`Canvas::render`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Draw the canvas once.
    #[default]
    Normal,
    /// Repeat the canvas across a 4× viewport; drawing wraps toroidally.
    Tiled,
    /// Draw the canvas at full, 1/2 and 1/4 precision side by side.
    Scaled,
}

/// A base raster plus the ordered log of committed actions.
///
/// The `cache` is a materialized view only: it is always reproducible by
/// replaying the committed log onto a fresh transparent surface, and every
/// mutation of the log (commit, undo, redo, base replacement) rebuilds it
/// from scratch. Nothing else ever writes to it.
pub struct Canvas {
    raster: Surface,
    cache: Surface,
    acts: VecDeque<Action>,
    redo_acts: VecDeque<Action>,
    /// The in-progress action owned by the armed tool, mirrored here so the
    /// compositor can draw it transiently. Single-owner: tools go through
    /// `set_active` / `active_mut` / `commit_active` / `cancel_active`.
    active: Option<Action>,
    zoom: u32,
    grid_visible: bool,
    render_mode: RenderMode,
}

impl Canvas {
    pub fn new(raster: Surface) -> Self {
        let cache = Surface::new(raster.width(), raster.height());
        Self {
            raster,
            cache,
            acts: VecDeque::new(),
            redo_acts: VecDeque::new(),
            active: None,
            zoom: 1,
            grid_visible: true,
            render_mode: RenderMode::Normal,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Replace the base raster. Both stacks are discarded — the log of a
    /// previous image has no meaning over a new one.
    pub fn set_image(&mut self, raster: Surface) {
        self.raster = raster;
        self.acts.clear();
        self.redo_acts.clear();
        self.active = None;
        self.rebuild_cache();
    }

    // ---- log protocol ------------------------------------------------------

    /// Append a finished action and rebuild. Any undone actions become
    /// unreachable: committing after an undo clears the redo stack.
    pub fn commit(&mut self, action: Action) {
        self.acts.push_back(action);
        self.redo_acts.clear();
        self.rebuild_cache();
        debug!("committed action, log depth {}", self.acts.len());
    }

    /// Move the newest committed action onto the redo stack. Returns false
    /// (and does nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.acts.pop_back() {
            Some(act) => {
                self.redo_acts.push_front(act);
                self.rebuild_cache();
                true
            }
            None => {
                debug!("undo ignored: empty stack");
                false
            }
        }
    }

    /// Re-commit the most recently undone action. Returns false when the
    /// redo stack is empty.
    pub fn redo(&mut self) -> bool {
        match self.redo_acts.pop_front() {
            Some(act) => {
                self.acts.push_back(act);
                self.rebuild_cache();
                true
            }
            None => {
                debug!("redo ignored: empty stack");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.acts.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_acts.is_empty()
    }

    /// True once anything has been committed over the current base raster.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.acts.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.acts.len()
    }

    // ---- active (in-progress) action ---------------------------------------

    pub fn set_active(&mut self, action: Action) {
        self.active = Some(action);
    }

    pub fn active(&self) -> Option<&Action> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Action> {
        self.active.as_mut()
    }

    /// Freeze the in-progress action into the log. No-op without one.
    pub fn commit_active(&mut self) -> bool {
        match self.active.take() {
            Some(act) => {
                self.commit(act);
                true
            }
            None => false,
        }
    }

    /// Throw the in-progress action away. No-op without one.
    pub fn cancel_active(&mut self) -> bool {
        self.active.take().is_some()
    }

    // ---- replay ------------------------------------------------------------

    /// True when some committed action has captured-and-replaced the
    /// composite, superseding the base raster for everything at or after it.
    /// Scanned from the log on every call — the log is the single source of
    /// truth here, so the answer can never go stale across undo/redo.
    pub fn base_absorbed(&self) -> bool {
        self.acts.iter().any(|a| a.copies_raster())
    }

    /// Rebuild the cache by replaying the whole committed log onto a fresh
    /// transparent surface.
    ///
    /// Additive actions paint from their frozen parameters alone. An action
    /// whose `copies_raster` flag is set instead receives the composite as it
    /// stood just before it — base raster underneath, unless an earlier
    /// copies-raster action already absorbed it — and replaces the drawn
    /// region wholesale.
    fn rebuild_cache(&mut self) {
        let mut work = Surface::new(self.raster.width(), self.raster.height());
        let mut absorbed = false;
        for act in &self.acts {
            if act.copies_raster() {
                let below = if absorbed {
                    work.clone()
                } else {
                    let mut c = self.raster.clone();
                    c.blit(&work, 0, 0);
                    c
                };
                act.paint(&mut work, Some(&below));
                absorbed = true;
            } else {
                act.paint(&mut work, None);
            }
        }
        self.cache = work;
        debug!(
            "cache rebuilt: {} actions, base absorbed: {}",
            self.acts.len(),
            absorbed
        );
    }

    /// Flatten base + committed log into one image-sized surface. The base
    /// raster is layered underneath only while no committed action has
    /// absorbed it.
    pub fn composite(&self) -> Surface {
        if self.base_absorbed() {
            let mut out = Surface::new(self.width(), self.height());
            out.blit(&self.cache, 0, 0);
            out
        } else {
            let mut out = self.raster.clone();
            out.blit(&self.cache, 0, 0);
            out
        }
    }

    /// Composite color under a point, for color picking. None out of bounds.
    pub fn color_at(&self, p: Point) -> Option<Rgba<u8>> {
        if p.x < 0 || p.y < 0 || p.x as u32 >= self.width() || p.y as u32 >= self.height() {
            return None;
        }
        Some(self.composite().get(p.x as u32, p.y as u32))
    }

    // ---- presentation ------------------------------------------------------

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom.clamp(1, 32);
    }

    pub fn zoom_in(&mut self) {
        if self.zoom < 32 {
            self.zoom *= 2;
        }
    }

    pub fn zoom_out(&mut self) {
        if self.zoom > 1 {
            self.zoom /= 2;
        }
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid_visible = visible;
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    /// Wraparound policy implied by the render mode: a tiled canvas is a
    /// torus, so region algorithms must wrap with it.
    pub fn wrap(&self) -> Wrap {
        match self.render_mode {
            RenderMode::Tiled => Wrap::Toroidal,
            _ => Wrap::Bounded,
        }
    }

    /// Viewport size of [`Canvas::render`] for the current mode and zoom.
    pub fn render_size(&self) -> (u32, u32) {
        let cw = self.width() * self.zoom;
        let ch = self.height() * self.zoom;
        match self.render_mode {
            RenderMode::Normal => (cw, ch),
            RenderMode::Tiled => (cw * 4, ch * 4),
            RenderMode::Scaled => (cw * 7 / 4, ch),
        }
    }

    /// Produce the display image: base (unless absorbed) + cache + the
    /// in-progress action, under the current render mode, zoom, and grid
    /// overlay.
    pub fn render(&self) -> RgbaImage {
        let (vw, vh) = self.render_size();
        let mut out = RgbaImage::new(vw.max(1), vh.max(1));

        // The in-progress action renders onto its own transparent layer so
        // that it composites over the cache exactly once per tile.
        let active_layer = self.active.as_ref().map(|act| {
            let mut layer = Surface::new(self.width(), self.height());
            act.paint(&mut layer, None);
            layer
        });

        let cw = self.width() * self.zoom;
        let ch = self.height() * self.zoom;

        let draw_cell = |out: &mut RgbaImage, ox: i64, oy: i64, num: u32, den: u32| {
            if !self.base_absorbed() {
                draw_scaled(out, self.raster.as_image(), ox, oy, num, den);
            }
            draw_scaled(out, self.cache.as_image(), ox, oy, num, den);
            if let Some(layer) = &active_layer {
                draw_scaled(out, layer.as_image(), ox, oy, num, den);
            }
        };

        match self.render_mode {
            RenderMode::Normal => draw_cell(&mut out, 0, 0, self.zoom, 1),
            RenderMode::Tiled => {
                let mut oy = 0i64;
                while oy < vh as i64 {
                    let mut ox = 0i64;
                    while ox < vw as i64 {
                        draw_cell(&mut out, ox, oy, self.zoom, 1);
                        ox += cw.max(1) as i64;
                    }
                    oy += ch.max(1) as i64;
                }
            }
            RenderMode::Scaled => {
                draw_cell(&mut out, 0, 0, self.zoom, 1);
                draw_cell(&mut out, cw as i64, 0, self.zoom, 2);
                draw_cell(&mut out, cw as i64 + (cw / 2) as i64, 0, self.zoom, 4);
            }
        }

        // Pixel grid: only legible at high zoom. Lines invert the underlying
        // color so they stay visible over any image.
        if self.grid_visible && self.zoom >= 8 {
            let z = self.zoom;
            for y in 0..ch.min(out.height()) {
                for x in 0..cw.min(out.width()) {
                    if x % z == 0 || y % z == 0 {
                        let p = out.get_pixel_mut(x, y);
                        p[0] = 255 - p[0];
                        p[1] = 255 - p[1];
                        p[2] = 255 - p[2];
                    }
                }
            }
        }

        out
    }
}

/// Nearest-neighbor draw of `src` scaled by `num/den` at offset `(ox, oy)`,
/// source-over, clipped to `out`.
fn draw_scaled(out: &mut RgbaImage, src: &RgbaImage, ox: i64, oy: i64, num: u32, den: u32) {
    if num == 0 || den == 0 {
        return;
    }
    let dw = (src.width() as u64 * num as u64 / den as u64) as u32;
    let dh = (src.height() as u64 * num as u64 / den as u64) as u32;
    for dy in 0..dh {
        let ty = oy + dy as i64;
        if ty < 0 || ty >= out.height() as i64 {
            continue;
        }
        let sy = (dy as u64 * den as u64 / num as u64) as u32;
        for dx in 0..dw {
            let tx = ox + dx as i64;
            if tx < 0 || tx >= out.width() as i64 {
                continue;
            }
            let sx = (dx as u64 * den as u64 / num as u64) as u32;
            let s = *src.get_pixel(sx, sy);
            if s[3] == 0 {
                continue;
            }
            let d = *out.get_pixel(tx as u32, ty as u32);
            out.put_pixel(tx as u32, ty as u32, blend_px(d, s));
        }
    }
}
