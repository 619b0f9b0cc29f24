//! Whole-canvas two-point gradient action.

use image::Rgba;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::canvas::{Surface, blend_px};
use crate::geometry::Point;

/// Interpolation layout between the two gesture points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientKind {
    /// First color at `p1`, second at `p2`, clamped beyond both.
    #[default]
    Linear,
    /// First color at `p1`, second at `p2` *and* at the mirror point
    /// `p1 - (p2 - p1)`.
    Mirrored,
    /// First color at `p1`, second on the circle through `p2`.
    Radial,
}

/// Fills the whole drawable region with a blend from `c1` to `c2` oriented by
/// the two gesture points. A degenerate gesture (`p1 == p2`) degrades to a
/// solid fill of `c2`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradientAction {
    pub p1: Point,
    pub p2: Point,
    pub c1: [u8; 4],
    pub c2: [u8; 4],
    pub kind: GradientKind,
}

impl GradientAction {
    pub fn new(p: Point, c1: [u8; 4], c2: [u8; 4], kind: GradientKind) -> Self {
        Self {
            p1: p,
            p2: p,
            c1,
            c2,
            kind,
        }
    }

    pub fn paint(&self, dst: &mut Surface) {
        let (cw, ch) = dst.clip_extent();
        let w = dst.width() as usize;
        let stride = w * 4;

        let (ax, ay) = (self.p1.x as f32, self.p1.y as f32);
        let dx = (self.p2.x - self.p1.x) as f32;
        let dy = (self.p2.y - self.p1.y) as f32;
        let len2 = dx * dx + dy * dy;
        let degenerate = len2 <= 0.0;
        let (c1, c2, kind) = (self.c1, self.c2, self.kind);

        dst.raw_pixels_mut()
            .par_chunks_mut(stride)
            .take(ch as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..cw as usize {
                    let src = if degenerate {
                        Rgba(c2)
                    } else {
                        // signed projection of the pixel center onto p1→p2,
                        // 0 at p1 and 1 at p2
                        let px = x as f32 + 0.5 - ax;
                        let py = y as f32 + 0.5 - ay;
                        let t = match kind {
                            GradientKind::Linear => (px * dx + py * dy) / len2,
                            GradientKind::Mirrored => {
                                ((px * dx + py * dy) / len2).abs()
                            }
                            GradientKind::Radial => (px * px + py * py).sqrt() / len2.sqrt(),
                        };
                        lerp(c1, c2, t.clamp(0.0, 1.0))
                    };
                    if src[3] == 0 {
                        continue;
                    }
                    let o = x * 4;
                    let dst_px = Rgba([row[o], row[o + 1], row[o + 2], row[o + 3]]);
                    let out = blend_px(dst_px, src);
                    row[o..o + 4].copy_from_slice(&out.0);
                }
            });
    }
}

#[inline]
fn lerp(a: [u8; 4], b: [u8; 4], t: f32) -> Rgba<u8> {
    let ch = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8;
    Rgba([ch(0), ch(1), ch(2), ch(3)])
}
