//! Line and freehand-stroke actions, plus the line rasterizer they share.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::Surface;
use crate::geometry::{Point, Rect};

/// Distance from point `(px, py)` to the segment `a`–`b`.
#[inline]
pub(crate) fn segment_distance(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let (ax, ay) = (a.x as f32, a.y as f32);
    let (bx, by) = (b.x as f32, b.y as f32);
    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

/// Draw the segment `p1`–`p2` in `color`. Width ≤ 1 walks the Bresenham
/// line; wider strokes cover the band of pixels within `width / 2` of the
/// segment, hard-edged. Geometry off the surface clips away silently.
pub fn draw_line(dst: &mut Surface, p1: Point, p2: Point, color: [u8; 4], width: u32) {
    if width > 1 {
        let half = width as f32 / 2.0;
        let pad = (width / 2 + 1) as i32;
        let bb = Rect::spanning(p1, p2).padded(pad);
        for y in bb.min_y..=bb.max_y {
            for x in bb.min_x..=bb.max_x {
                let d = segment_distance(x as f32 + 0.5, y as f32 + 0.5, p1, p2);
                if d <= half {
                    dst.blend(x, y, Rgba(color));
                }
            }
        }
        return;
    }

    let (mut x, mut y) = (p1.x, p1.y);
    let dx = (p2.x - p1.x).abs();
    let sx = if p1.x < p2.x { 1 } else { -1 };
    let dy = -(p2.y - p1.y).abs();
    let sy = if p1.y < p2.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        dst.blend(x, y, Rgba(color));
        if x == p2.x && y == p2.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ============================================================================
// LINE
// ============================================================================

/// A straight line between two gesture points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineAction {
    pub p1: Point,
    pub p2: Point,
    pub color: [u8; 4],
    pub width: u32,
}

impl LineAction {
    /// Both endpoints start at the press point; dragging moves `p2`.
    pub fn new(p: Point, color: [u8; 4], width: u32) -> Self {
        Self {
            p1: p,
            p2: p,
            color,
            width,
        }
    }

    pub fn paint(&self, dst: &mut Surface) {
        draw_line(dst, self.p1, self.p2, self.color, self.width);
    }
}

// ============================================================================
// FREEHAND STROKE
// ============================================================================

/// Live points beyond this bake into the stroke's internal pixel cache, so a
/// long drag costs O(1) segments per repaint instead of O(points).
pub const MAX_LIVE_POINTS: usize = 64;

/// Prefix of a stroke already rasterized into a positioned sub-surface.
#[derive(Clone, Serialize, Deserialize)]
struct BakedStroke {
    image: Surface,
    x: i32,
    y: i32,
}

/// A freehand stroke: consecutive pointer positions joined by 1-px segments.
///
/// The point list only ever holds the tail of the gesture. Once it exceeds
/// [`MAX_LIVE_POINTS`], everything drawn so far is baked into a sub-surface
/// covering the stroke's bounding box and the list is trimmed back to its
/// last point (which anchors the next segment). Painting the baked cache plus
/// the live tail reproduces exactly the pixels of painting every segment.
#[derive(Clone, Serialize, Deserialize)]
pub struct StrokeAction {
    color: [u8; 4],
    pts: Vec<Point>,
    cache: Option<BakedStroke>,
}

impl StrokeAction {
    pub fn new(start: Point, color: [u8; 4]) -> Self {
        Self {
            color,
            pts: vec![start],
            cache: None,
        }
    }

    pub fn last_point(&self) -> Point {
        *self.pts.last().expect("stroke always holds >= 1 point")
    }

    /// Append a gesture point, baking down the prefix when the live list has
    /// grown past the threshold.
    pub fn add(&mut self, p: Point) {
        self.pts.push(p);
        if self.pts.len() > MAX_LIVE_POINTS {
            self.bake();
        }
    }

    /// Rasterize cache + live points into a fresh sub-surface covering their
    /// joint bounds, then trim the live list to its last point.
    fn bake(&mut self) {
        let mut bb = Rect::at(self.pts[0]);
        for p in &self.pts[1..] {
            bb = bb.include(*p);
        }
        if let Some(c) = &self.cache {
            bb = bb.union(Rect::new(
                c.x,
                c.y,
                c.x + c.image.width() as i32 - 1,
                c.y + c.image.height() as i32 - 1,
            ));
        }

        let mut image = Surface::new(bb.width(), bb.height());
        self.paint_at(&mut image, -bb.min_x, -bb.min_y);

        let last = self.last_point();
        self.pts.clear();
        self.pts.push(last);
        self.cache = Some(BakedStroke {
            image,
            x: bb.min_x,
            y: bb.min_y,
        });
    }

    pub fn paint(&self, dst: &mut Surface) {
        self.paint_at(dst, 0, 0);
    }

    fn paint_at(&self, dst: &mut Surface, shift_x: i32, shift_y: i32) {
        if let Some(c) = &self.cache {
            dst.blit(&c.image, c.x + shift_x, c.y + shift_y);
        }
        let mut prev = self.pts[0];
        for &p in &self.pts {
            draw_line(
                dst,
                Point::new(prev.x + shift_x, prev.y + shift_y),
                Point::new(p.x + shift_x, p.y + shift_y),
                self.color,
                1,
            );
            prev = p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn diagonal_line_hits_endpoints() {
        let mut s = Surface::new(32, 32);
        draw_line(&mut s, Point::new(0, 0), Point::new(31, 31), BLACK, 1);
        assert_eq!(s.get(0, 0), Rgba(BLACK));
        assert_eq!(s.get(31, 31), Rgba(BLACK));
        assert_eq!(s.get(15, 15), Rgba(BLACK));
        assert_eq!(s.get(0, 31), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn zero_length_line_plots_one_pixel() {
        let mut s = Surface::new(8, 8);
        draw_line(&mut s, Point::new(3, 3), Point::new(3, 3), BLACK, 1);
        assert_eq!(s.get(3, 3), Rgba(BLACK));
        assert_eq!(s.get(2, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn thick_line_covers_band() {
        let mut s = Surface::new(16, 16);
        draw_line(&mut s, Point::new(2, 8), Point::new(13, 8), BLACK, 5);
        assert_eq!(s.get(8, 8), Rgba(BLACK));
        assert_eq!(s.get(8, 6), Rgba(BLACK));
        assert_eq!(s.get(8, 10), Rgba(BLACK));
        assert_eq!(s.get(8, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn off_surface_line_paints_nothing() {
        let mut s = Surface::new(8, 8);
        draw_line(&mut s, Point::new(-20, -5), Point::new(-3, -9), BLACK, 3);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(s.get(x, y), Rgba([0, 0, 0, 0]));
            }
        }
    }

    #[test]
    fn bake_is_pixel_identical() {
        // Same zig-zag gesture, far past the bake threshold.
        let gesture: Vec<Point> = (0..150)
            .map(|i| Point::new(i % 97, (i * 7) % 89))
            .collect();

        let mut baked = StrokeAction::new(gesture[0], BLACK);
        for p in &gesture[1..] {
            baked.add(*p);
        }
        assert!(baked.cache.is_some());

        // Bypass `add` so the whole gesture stays live.
        let unbaked = StrokeAction {
            color: BLACK,
            pts: gesture,
            cache: None,
        };

        let mut a = Surface::new(100, 100);
        let mut b = Surface::new(100, 100);
        baked.paint(&mut a);
        unbaked.paint(&mut b);
        assert_eq!(a.as_image().as_raw(), b.as_image().as_raw());
    }

    #[test]
    fn bake_trims_live_points() {
        let mut stroke = StrokeAction::new(Point::new(0, 0), BLACK);
        for i in 1..=(MAX_LIVE_POINTS as i32 + 1) {
            stroke.add(Point::new(i, 0));
        }
        assert!(stroke.pts.len() <= 2);
        assert_eq!(stroke.last_point(), Point::new(MAX_LIVE_POINTS as i32 + 1, 0));
    }
}
