//! Whole-canvas effect actions.
//!
//! Every effect except `Fade` re-samples the composite beneath it (handed in
//! by the replay engine) and replaces the drawn region with its output —
//! which is why they carry the copies-raster flag. `Fade` merely composites a
//! translucent wash over whatever is already there.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::canvas::{Surface, blend_px};

/// A deterministic per-pixel or convolution pass over the composite.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EffectAction {
    /// `amount`×`amount` box blur. Pixels whose window overruns the image
    /// edge are copied through unchanged.
    Blur { amount: u32 },
    /// Scale RGB by `amount` (1.0 = identity), keeping alpha.
    Value { amount: f32 },
    /// 255 − channel on RGB, keeping alpha.
    Invert,
    /// Composite `color` over the canvas at `amount` opacity (0..=1).
    Fade { color: [u8; 4], amount: f32 },
    /// Luminance-preserving saturation scale: 0 = grayscale, 1 = identity,
    /// above 1 oversaturates.
    Saturation { amount: f32 },
}

impl EffectAction {
    /// Whether this effect captures and replaces the composite rather than
    /// drawing over it.
    pub fn copies_raster(&self) -> bool {
        !matches!(self, EffectAction::Fade { .. })
    }

    pub fn paint(&self, dst: &mut Surface, composite: Option<&Surface>) {
        match self {
            EffectAction::Blur { amount } => {
                let Some(src) = composite else { return };
                let out = box_blur(src.as_image(), *amount);
                dst.overwrite(&out);
            }
            EffectAction::Value { amount } => {
                let Some(src) = composite else { return };
                let amt = *amount;
                let out = per_pixel(src.as_image(), move |r, g, b, a| {
                    (r * amt, g * amt, b * amt, a)
                });
                dst.overwrite(&out);
            }
            EffectAction::Invert => {
                let Some(src) = composite else { return };
                let out = per_pixel(src.as_image(), |r, g, b, a| {
                    (255.0 - r, 255.0 - g, 255.0 - b, a)
                });
                dst.overwrite(&out);
            }
            EffectAction::Saturation { amount } => {
                let Some(src) = composite else { return };
                let amt = *amount;
                let out = per_pixel(src.as_image(), move |r, g, b, a| {
                    let p = (r * r * 0.299 + g * g * 0.587 + b * b * 0.114).sqrt();
                    (
                        p + (r - p) * amt,
                        p + (g - p) * amt,
                        p + (b - p) * amt,
                        a,
                    )
                });
                dst.overwrite(&out);
            }
            EffectAction::Fade { color, amount } => {
                let a = (amount.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
                if a == 0 {
                    return;
                }
                let wash = Rgba([color[0], color[1], color[2], a]);
                let (cw, ch) = dst.clip_extent();
                let stride = dst.width() as usize * 4;
                dst.raw_pixels_mut()
                    .par_chunks_mut(stride)
                    .take(ch as usize)
                    .for_each(|row| {
                        for x in 0..cw as usize {
                            let o = x * 4;
                            let d = Rgba([row[o], row[o + 1], row[o + 2], row[o + 3]]);
                            row[o..o + 4].copy_from_slice(&blend_px(d, wash).0);
                        }
                    });
            }
        }
    }
}

/// Row-parallel per-pixel transform; channels as f32, clamped back to u8.
fn per_pixel<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let (w, h) = (src.width() as usize, src.height() as usize);
    let stride = w * 4;
    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let o = x * 4;
                let (r, g, b, a) = transform(
                    row_in[o] as f32,
                    row_in[o + 1] as f32,
                    row_in[o + 2] as f32,
                    row_in[o + 3] as f32,
                );
                row_out[o] = r.round().clamp(0.0, 255.0) as u8;
                row_out[o + 1] = g.round().clamp(0.0, 255.0) as u8;
                row_out[o + 2] = b.round().clamp(0.0, 255.0) as u8;
                row_out[o + 3] = a.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

/// Box blur over all four channels. The kernel window anchors at
/// `(amount-1)/2`; where it does not fit entirely inside the image the source
/// pixel passes through unchanged. `amount <= 1` is the identity.
fn box_blur(src: &RgbaImage, amount: u32) -> RgbaImage {
    if amount <= 1 {
        return src.clone();
    }
    let (w, h) = (src.width() as i64, src.height() as i64);
    let n = amount as i64;
    let (ox, oy) = ((n - 1) / 2, (n - 1) / 2);
    let norm = (n * n) as f32;
    let stride = w as usize * 4;
    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; (w * h) as usize * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let y = y as i64;
            for x in 0..w {
                let o = x as usize * 4;
                let (x0, y0) = (x - ox, y - oy);
                if x0 < 0 || y0 < 0 || x0 + n > w || y0 + n > h {
                    // window hangs off the image: pass through
                    let i = (y * w + x) as usize * 4;
                    row_out[o..o + 4].copy_from_slice(&src_raw[i..i + 4]);
                    continue;
                }
                let mut acc = [0.0f32; 4];
                for ky in y0..y0 + n {
                    for kx in x0..x0 + n {
                        let i = (ky * w + kx) as usize * 4;
                        acc[0] += src_raw[i] as f32;
                        acc[1] += src_raw[i + 1] as f32;
                        acc[2] += src_raw[i + 2] as f32;
                        acc[3] += src_raw[i + 3] as f32;
                    }
                }
                for c in 0..4 {
                    row_out[o + c] = (acc[c] / norm).round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(effect: EffectAction, src: Surface) -> Surface {
        let mut dst = Surface::new(src.width(), src.height());
        effect.paint(&mut dst, Some(&src));
        dst
    }

    #[test]
    fn invert_flips_channels_keeps_alpha() {
        let out = run(EffectAction::Invert, Surface::filled(3, 3, [10, 200, 0, 130]));
        assert_eq!(out.get(1, 1), Rgba([245, 55, 255, 130]));
    }

    #[test]
    fn value_scales_and_clamps() {
        let out = run(
            EffectAction::Value { amount: 2.0 },
            Surface::filled(2, 2, [40, 180, 0, 255]),
        );
        assert_eq!(out.get(0, 0), Rgba([80, 255, 0, 255]));
    }

    #[test]
    fn saturation_zero_is_grayscale_and_one_is_identity() {
        let colored = Surface::filled(2, 2, [200, 40, 90, 255]);
        let gray = run(EffectAction::Saturation { amount: 0.0 }, colored.clone());
        let p = gray.get(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        let same = run(EffectAction::Saturation { amount: 1.0 }, colored);
        assert_eq!(same.get(0, 0), Rgba([200, 40, 90, 255]));
    }

    #[test]
    fn blur_averages_interior_and_copies_edges() {
        // white field with a black center dot
        let mut src = Surface::filled(5, 5, [255, 255, 255, 255]);
        src.set(2, 2, Rgba([0, 0, 0, 255]));
        let out = run(EffectAction::Blur { amount: 3 }, src);
        // corner window overruns: copied through
        assert_eq!(out.get(0, 0), Rgba([255, 255, 255, 255]));
        // center: 8 white + 1 black → 8/9 ≈ 227
        assert_eq!(out.get(2, 2), Rgba([227, 227, 227, 255]));
        // interior neighbor shares the dot in its window
        assert_eq!(out.get(1, 2), Rgba([227, 227, 227, 255]));
    }

    #[test]
    fn blur_amount_one_is_identity() {
        let src = Surface::filled(4, 4, [1, 2, 3, 4]);
        let out = run(EffectAction::Blur { amount: 1 }, src.clone());
        assert_eq!(out.as_image().as_raw(), src.as_image().as_raw());
    }

    #[test]
    fn fade_washes_toward_color() {
        let mut dst = Surface::filled(2, 2, [255, 255, 255, 255]);
        EffectAction::Fade {
            color: [0, 0, 0, 255],
            amount: 0.5,
        }
        .paint(&mut dst, None);
        let p = dst.get(0, 0);
        assert_eq!(p[3], 255);
        assert!((p[0] as i32 - 127).abs() <= 2);
    }

    #[test]
    fn fade_zero_amount_changes_nothing() {
        let mut dst = Surface::filled(2, 2, [9, 9, 9, 255]);
        EffectAction::Fade {
            color: [255, 255, 255, 255],
            amount: 0.0,
        }
        .paint(&mut dst, None);
        assert_eq!(dst.get(1, 1), Rgba([9, 9, 9, 255]));
    }
}
