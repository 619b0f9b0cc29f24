//! Text action: glyph layout with kerning, anchored by alignment.

use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::Surface;
use crate::geometry::{Point, Rect};

/// Horizontal placement of each line relative to the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of the text block relative to the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A parsed font kept together with its raw bytes so the action stays
/// serializable. Fonts reach the engine as bytes from whatever picker the
/// host application provides.
#[derive(Clone)]
pub struct FontHandle {
    data: Arc<Vec<u8>>,
    font: FontArc,
}

impl FontHandle {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        let font = FontArc::try_from_vec(data.clone())?;
        Ok(Self {
            data: Arc::new(data),
            font,
        })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Serialize for FontHandle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FontHandle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = Vec::<u8>::deserialize(deserializer)?;
        FontHandle::from_bytes(data).map_err(serde::de::Error::custom)
    }
}

/// Horizontal draw origin for one line of measured width `line_w`.
#[inline]
fn aligned_x(anchor_x: f32, line_w: f32, halign: HAlign) -> f32 {
    match halign {
        HAlign::Left => anchor_x,
        HAlign::Center => anchor_x - line_w / 2.0,
        HAlign::Right => anchor_x - line_w,
    }
}

/// Baseline of the first line. The anchor sits at the block's bottom by
/// default; Top/Middle shift the baseline down by the block height or half
/// of it.
#[inline]
fn first_baseline(anchor_y: f32, line_h: f32, total_h: f32, valign: VAlign) -> f32 {
    match valign {
        VAlign::Bottom => anchor_y,
        VAlign::Middle => anchor_y + line_h / 2.0 - (total_h - line_h) / 2.0,
        VAlign::Top => anchor_y + line_h,
    }
}

/// A string drawn at an anchor point. Multi-line via `\n`; each line is
/// aligned independently around the anchor's x.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextAction {
    pub anchor: Point,
    pub color: [u8; 4],
    pub text: String,
    pub font: FontHandle,
    /// Pixel height of the em square.
    pub size: f32,
    pub halign: HAlign,
    pub valign: VAlign,
}

impl TextAction {
    fn scale(&self) -> PxScale {
        PxScale::from(self.size.max(1.0))
    }

    fn line_widths(&self) -> Vec<f32> {
        let scaled = self.font.font().as_scaled(self.scale());
        self.text
            .split('\n')
            .map(|line| {
                let mut w = 0.0f32;
                let mut prev = None;
                for ch in line.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(p) = prev {
                        w += scaled.kern(p, id);
                    }
                    w += scaled.h_advance(id);
                    prev = Some(id);
                }
                w
            })
            .collect()
    }

    /// Conservative canvas-space bounds of the drawn block, for repaints.
    pub fn bounds(&self) -> Rect {
        let scaled = self.font.font().as_scaled(self.scale());
        let line_h = scaled.height();
        let widths = self.line_widths();
        let total_h = line_h * widths.len() as f32;
        let b0 = first_baseline(self.anchor.y as f32, line_h, total_h, self.valign);
        let max_w = widths.iter().cloned().fold(0.0f32, f32::max);
        let min_x = widths
            .iter()
            .map(|&w| aligned_x(self.anchor.x as f32, w, self.halign))
            .fold(f32::MAX, f32::min);
        Rect::new(
            min_x.floor() as i32 - 1,
            (b0 - scaled.ascent()).floor() as i32 - 1,
            (min_x + max_w).ceil() as i32 + 1,
            (b0 + (widths.len() as f32 - 1.0) * line_h - scaled.descent()).ceil() as i32 + 1,
        )
    }

    pub fn paint(&self, dst: &mut Surface) {
        if self.text.is_empty() {
            return;
        }
        let font = self.font.font().clone();
        let scale = self.scale();
        let scaled = font.as_scaled(scale);
        let line_h = scaled.height();
        let widths = self.line_widths();
        let total_h = line_h * widths.len() as f32;
        let b0 = first_baseline(self.anchor.y as f32, line_h, total_h, self.valign);
        let color = self.color;

        for (i, line) in self.text.split('\n').enumerate() {
            let mut x = aligned_x(self.anchor.x as f32, widths[i], self.halign);
            let baseline = b0 + i as f32 * line_h;
            let mut prev = None;
            for ch in line.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(p) = prev {
                    x += scaled.kern(p, id);
                }
                let glyph = id.with_scale_and_position(scale, point(x, baseline));
                if let Some(outlined) = font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|gx, gy, cov| {
                        if cov <= 0.0 {
                            return;
                        }
                        let px = bounds.min.x as i32 + gx as i32;
                        let py = bounds.min.y as i32 + gy as i32;
                        let a = (color[3] as f32 * cov.min(1.0)).round() as u8;
                        dst.blend(px, py, Rgba([color[0], color[1], color[2], a]));
                    });
                }
                x += scaled.h_advance(id);
                prev = Some(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_align_keeps_anchor() {
        assert_eq!(aligned_x(10.0, 40.0, HAlign::Left), 10.0);
    }

    #[test]
    fn center_and_right_shift_by_measured_width() {
        assert_eq!(aligned_x(10.0, 40.0, HAlign::Center), -10.0);
        assert_eq!(aligned_x(10.0, 40.0, HAlign::Right), -30.0);
    }

    #[test]
    fn single_line_baselines_match_legacy_offsets() {
        // one line: bottom anchors the baseline, middle/top shift down by
        // half and full line height
        assert_eq!(first_baseline(100.0, 16.0, 16.0, VAlign::Bottom), 100.0);
        assert_eq!(first_baseline(100.0, 16.0, 16.0, VAlign::Middle), 108.0);
        assert_eq!(first_baseline(100.0, 16.0, 16.0, VAlign::Top), 116.0);
    }

    #[test]
    fn middle_centers_multi_line_blocks() {
        // three lines of 16: block of 48 centered on the anchor
        let b0 = first_baseline(100.0, 16.0, 48.0, VAlign::Middle);
        let last = b0 + 2.0 * 16.0;
        // anchor halfway between first-line top (b0 - 16) and last baseline
        assert_eq!((b0 - 16.0 + last) / 2.0, 100.0);
    }
}
