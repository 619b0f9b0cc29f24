//! Whole-canvas geometric transforms, plus the recorded canvas resize.
//!
//! Transforms capture the composite beneath them and replace the canvas with
//! an inverse-mapped resampling of it: for every destination pixel the
//! source position is computed and sampled (bilinear for rotate/zoom,
//! nearest for the mirror flips). Anything mapping outside the source comes
//! back transparent.

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::canvas::Surface;

/// Sample `img` at a continuous position, bilinearly; transparent outside.
fn sample_bilinear(img: &RgbaImage, fx: f32, fy: f32) -> [f32; 4] {
    let (w, h) = (img.width() as i32, img.height() as i32);
    // align to pixel centers
    let x = fx - 0.5;
    let y = fy - 0.5;
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let fetch = |px: i32, py: i32| -> [f32; 4] {
        if px < 0 || py < 0 || px >= w || py >= h {
            return [0.0; 4];
        }
        let p = img.get_pixel(px as u32, py as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * tx;
        let bot = p01[c] + (p11[c] - p01[c]) * tx;
        out[c] = top + (bot - top) * ty;
    }
    out
}

/// Inverse-map every destination pixel through `map` and sample the source.
fn resample<F>(src: &RgbaImage, bilinear: bool, map: F) -> RgbaImage
where
    F: Fn(f32, f32) -> (f32, f32) + Sync,
{
    let (w, h) = (src.width(), src.height());
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; stride * h as usize];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w as usize {
                let (sx, sy) = map(x as f32 + 0.5, y as f32 + 0.5);
                let px = if bilinear {
                    let s = sample_bilinear(src, sx, sy);
                    [
                        s[0].round().clamp(0.0, 255.0) as u8,
                        s[1].round().clamp(0.0, 255.0) as u8,
                        s[2].round().clamp(0.0, 255.0) as u8,
                        s[3].round().clamp(0.0, 255.0) as u8,
                    ]
                } else {
                    let (ix, iy) = (sx.floor() as i32, sy.floor() as i32);
                    if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                        [0; 4]
                    } else {
                        src.get_pixel(ix as u32, iy as u32).0
                    }
                };
                let o = x * 4;
                row[o..o + 4].copy_from_slice(&px);
            }
        });

    RgbaImage::from_raw(w, h, dst_raw).unwrap()
}

/// A geometric transform of the whole composite. All variants copy the
/// raster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TransformAction {
    /// Clockwise rotation about the canvas center, in degrees, bilinear.
    Rotate { degrees: f32 },
    /// Scale about the canvas center, in percent (100 = identity), bilinear.
    /// Non-positive percentages degrade to a cleared canvas.
    Zoom { percent: f32 },
    /// Mirror across the vertical axis.
    FlipH,
    /// Mirror across the horizontal axis.
    FlipV,
}

impl TransformAction {
    pub fn paint(&self, dst: &mut Surface, composite: Option<&Surface>) {
        let Some(src) = composite else { return };
        let img = src.as_image();
        let (w, h) = (img.width() as f32, img.height() as f32);

        let out = match self {
            TransformAction::Rotate { degrees } => {
                let theta = degrees.to_radians();
                let (sin, cos) = theta.sin_cos();
                let (cx, cy) = (w / 2.0, h / 2.0);
                resample(img, true, move |x, y| {
                    let dx = x - cx;
                    let dy = y - cy;
                    (cx + dx * cos + dy * sin, cy - dx * sin + dy * cos)
                })
            }
            TransformAction::Zoom { percent } => {
                let z = percent / 100.0;
                if z <= 0.0 {
                    dst.clear();
                    return;
                }
                let (tx, ty) = (w * (1.0 - z) / 2.0, h * (1.0 - z) / 2.0);
                resample(img, true, move |x, y| ((x - tx) / z, (y - ty) / z))
            }
            TransformAction::FlipH => resample(img, false, move |x, y| (w - x, y)),
            TransformAction::FlipV => resample(img, false, move |x, y| (x, h - y)),
        };
        dst.overwrite(&out);
    }
}

/// A recorded canvas resize. It does not reallocate anything: it narrows the
/// surface draw-clip, so every action replayed after it is confined to the
/// new dimensions. Content already outside them stays as painted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResizeAction {
    pub width: u32,
    pub height: u32,
}

impl ResizeAction {
    pub fn paint(&self, dst: &mut Surface) {
        dst.set_clip(self.width, self.height);
    }
}
