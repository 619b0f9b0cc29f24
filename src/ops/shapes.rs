//! Two-corner shape actions: rectangle and oval.
//!
//! Outline and fill colors are independently optional; a `None` component is
//! simply not drawn. The spanned box has inclusive corners, so a zero-drag
//! gesture still covers one pixel.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::Surface;
use crate::geometry::{Point, Rect};

/// Signed distance to an ellipse centered at the origin with radii
/// `(rx, ry)`; negative inside. Approximation via normalised-circle space,
/// good to a fraction of a pixel for on-canvas radii.
#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// An axis-aligned rectangle spanned by two gesture corners.
///
/// The outline is the 1-px ring of the spanned box; the fill covers the
/// interior strictly inside that ring. The two never overlap, so a two-color
/// rectangle reads as border + infill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RectAction {
    pub p1: Point,
    pub p2: Point,
    pub outline: Option<[u8; 4]>,
    pub fill: Option<[u8; 4]>,
}

impl RectAction {
    pub fn new(p: Point, outline: Option<[u8; 4]>, fill: Option<[u8; 4]>) -> Self {
        Self {
            p1: p,
            p2: p,
            outline,
            fill,
        }
    }

    pub fn paint(&self, dst: &mut Surface) {
        let r = Rect::spanning(self.p1, self.p2);
        if let Some(color) = self.outline {
            let c = Rgba(color);
            for x in r.min_x..=r.max_x {
                dst.blend(x, r.min_y, c);
                if r.max_y != r.min_y {
                    dst.blend(x, r.max_y, c);
                }
            }
            for y in (r.min_y + 1)..r.max_y {
                dst.blend(r.min_x, y, c);
                if r.max_x != r.min_x {
                    dst.blend(r.max_x, y, c);
                }
            }
        }
        if let Some(color) = self.fill {
            let c = Rgba(color);
            for y in (r.min_y + 1)..r.max_y {
                for x in (r.min_x + 1)..r.max_x {
                    dst.blend(x, y, c);
                }
            }
        }
    }
}

/// An ellipse inscribed in the box spanned by two gesture corners.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OvalAction {
    pub p1: Point,
    pub p2: Point,
    pub outline: Option<[u8; 4]>,
    pub fill: Option<[u8; 4]>,
}

impl OvalAction {
    pub fn new(p: Point, outline: Option<[u8; 4]>, fill: Option<[u8; 4]>) -> Self {
        Self {
            p1: p,
            p2: p,
            outline,
            fill,
        }
    }

    pub fn paint(&self, dst: &mut Surface) {
        let r = Rect::spanning(self.p1, self.p2);
        // Continuous box [min, max+1) so the ellipse touches the outer pixel
        // edges of the spanned rect.
        let cx = (r.min_x as f32 + r.max_x as f32 + 1.0) / 2.0;
        let cy = (r.min_y as f32 + r.max_y as f32 + 1.0) / 2.0;
        let rx = r.width() as f32 / 2.0;
        let ry = r.height() as f32 / 2.0;

        for y in r.min_y..=r.max_y {
            for x in r.min_x..=r.max_x {
                let d = sdf_ellipse(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy, rx, ry);
                // fill beneath outline, as with the rectangle ring
                if d < 0.0
                    && let Some(color) = self.fill
                {
                    dst.blend(x, y, Rgba(color));
                }
                if d.abs() <= 0.5
                    && let Some(color) = self.outline
                {
                    dst.blend(x, y, Rgba(color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn outline_rect_draws_ring_only() {
        let mut s = Surface::new(8, 8);
        let mut a = RectAction::new(Point::new(2, 2), Some(RED), None);
        a.p2 = Point::new(5, 5);
        a.paint(&mut s);
        assert_eq!(s.get(2, 2), Rgba(RED));
        assert_eq!(s.get(5, 2), Rgba(RED));
        assert_eq!(s.get(2, 5), Rgba(RED));
        assert_eq!(s.get(5, 5), Rgba(RED));
        assert_eq!(s.get(3, 2), Rgba(RED));
        assert_eq!(s.get(2, 4), Rgba(RED));
        // interior untouched
        assert_eq!(s.get(3, 3), CLEAR);
        assert_eq!(s.get(4, 4), CLEAR);
        // outside untouched
        assert_eq!(s.get(6, 3), CLEAR);
    }

    #[test]
    fn two_color_rect_fills_inside_ring() {
        let mut s = Surface::new(8, 8);
        let mut a = RectAction::new(Point::new(1, 1), Some(RED), Some(BLUE));
        a.p2 = Point::new(6, 6);
        a.paint(&mut s);
        assert_eq!(s.get(1, 1), Rgba(RED));
        assert_eq!(s.get(3, 3), Rgba(BLUE));
        assert_eq!(s.get(5, 5), Rgba(BLUE));
        assert_eq!(s.get(6, 4), Rgba(RED));
    }

    #[test]
    fn degenerate_rect_is_one_pixel() {
        let mut s = Surface::new(4, 4);
        let a = RectAction::new(Point::new(2, 2), Some(RED), Some(BLUE));
        a.paint(&mut s);
        assert_eq!(s.get(2, 2), Rgba(RED));
        assert_eq!(s.get(1, 2), CLEAR);
        assert_eq!(s.get(3, 2), CLEAR);
    }

    #[test]
    fn filled_oval_covers_center_not_corners() {
        let mut s = Surface::new(12, 12);
        let mut a = OvalAction::new(Point::new(1, 1), None, Some(BLUE));
        a.p2 = Point::new(10, 10);
        a.paint(&mut s);
        assert_eq!(s.get(5, 5), Rgba(BLUE));
        assert_eq!(s.get(6, 6), Rgba(BLUE));
        // box corners lie outside the inscribed ellipse
        assert_eq!(s.get(1, 1), CLEAR);
        assert_eq!(s.get(10, 10), CLEAR);
    }

    #[test]
    fn oval_outline_touches_box_edges() {
        let mut s = Surface::new(12, 12);
        let mut a = OvalAction::new(Point::new(1, 1), Some(RED), None);
        a.p2 = Point::new(10, 10);
        a.paint(&mut s);
        // extreme points of the ellipse sit mid-edge of the box
        assert_eq!(s.get(5, 1), Rgba(RED));
        assert_eq!(s.get(1, 5), Rgba(RED));
        assert_eq!(s.get(5, 10), Rgba(RED));
        assert_eq!(s.get(10, 5), Rgba(RED));
        // center stays empty
        assert_eq!(s.get(5, 5), CLEAR);
    }

    #[test]
    fn off_canvas_shape_paints_nothing() {
        let mut s = Surface::new(8, 8);
        let mut a = RectAction::new(Point::new(20, 20), Some(RED), Some(BLUE));
        a.p2 = Point::new(30, 25);
        a.paint(&mut s);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(s.get(x, y), CLEAR);
            }
        }
    }
}
