//! Flood-fill action: captures its source once, computes its region lazily.

use std::sync::OnceLock;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::Surface;
use crate::geometry::{Point, Rect};
use crate::ops::flood::{EdgeDetect, FloodFill, Wrap};

/// The computed fill region, rasterized into a patch the size of its
/// bounding box. None when the seed matched nothing.
#[derive(Clone)]
struct FillPatch {
    image: Surface,
    x: i32,
    y: i32,
}

/// A bucket fill seeded at one point.
///
/// The fill depends on the pixels around the seed, so it snapshots the
/// composite as it stood the moment the gesture happened; that snapshot is
/// part of the action's frozen parameters and is what marks the action as
/// having absorbed the raster beneath it. The actual region grow runs once,
/// lazily, the first time the action paints, and its output is cached as a
/// bounding-box-sized patch.
///
/// With two distinct colors the region is drawn two-tone: `border` along the
/// region's inner edge, `interior` elsewhere — one flood fill plus one edge
/// pass, no second fill.
#[derive(Clone, Serialize, Deserialize)]
pub struct FillAction {
    pub origin: Point,
    pub border: [u8; 4],
    pub interior: [u8; 4],
    /// Carried for a future tolerance metric; matching is exact-only.
    pub threshold: u8,
    pub wrap: Wrap,
    source: Surface,
    #[serde(skip)]
    patch: OnceLock<Option<FillPatch>>,
}

impl FillAction {
    /// `source` is the composite at gesture time. A one-color fill passes the
    /// same color for `border` and `interior`.
    pub fn new(
        source: Surface,
        origin: Point,
        border: [u8; 4],
        interior: [u8; 4],
        threshold: u8,
        wrap: Wrap,
    ) -> Self {
        Self {
            origin,
            border,
            interior,
            threshold,
            wrap,
            source,
            patch: OnceLock::new(),
        }
    }

    /// Bounding box of the filled region, None when the fill hit nothing.
    pub fn bounds(&self) -> Option<Rect> {
        self.compute()
            .as_ref()
            .map(|p| Rect::new(p.x, p.y, p.x + p.image.width() as i32 - 1, p.y + p.image.height() as i32 - 1))
    }

    fn compute(&self) -> &Option<FillPatch> {
        self.patch.get_or_init(|| {
            let fill = FloodFill::run(&self.source, self.origin, self.threshold, self.wrap);
            let bounds = fill.bounds()?;
            let mut image = Surface::new(bounds.width(), bounds.height());

            if self.border == self.interior {
                for (x, y) in fill.pixels() {
                    image.set(
                        x - bounds.min_x as u32,
                        y - bounds.min_y as u32,
                        Rgba(self.border),
                    );
                }
            } else {
                let edge = EdgeDetect::run(&fill);
                for (x, y) in fill.pixels() {
                    let color = if edge.contains(x, y) {
                        self.border
                    } else {
                        self.interior
                    };
                    image.set(x - bounds.min_x as u32, y - bounds.min_y as u32, Rgba(color));
                }
            }

            Some(FillPatch {
                image,
                x: bounds.min_x,
                y: bounds.min_y,
            })
        })
    }

    pub fn paint(&self, dst: &mut Surface) {
        if let Some(patch) = self.compute() {
            dst.blit(&patch.image, patch.x, patch.y);
        }
    }
}
