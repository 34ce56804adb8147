//! Debug overlay: small filled squares at marker centres.

use dotgrid_core::{Bgra, FrameViewMut};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    /// Square side is `2 * half_size + 1`.
    pub half_size: u32,
    /// Pixels closer than this to the frame edge are never painted.
    pub border_margin: u32,
    pub color: Bgra,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            half_size: 5,
            border_margin: 5,
            color: Bgra::RED,
        }
    }
}

/// Paint a square at every centre. Returns the number of pixels written.
///
/// A pixel is skipped when `x < m`, `y < m`, `x > width - m` or
/// `y > height - m`, with `m = border_margin`. Alpha is preserved.
pub fn annotate_markers(
    frame: &mut FrameViewMut<'_>,
    centers: impl IntoIterator<Item = Point2<i32>>,
    params: &OverlayParams,
) -> usize {
    let margin = params.border_margin as i64;
    let half = params.half_size as i64;
    let max_x = frame.width() as i64 - margin;
    let max_y = frame.height() as i64 - margin;

    let mut painted = 0;
    for c in centers {
        let (cx, cy) = (c.x as i64, c.y as i64);
        for y in (cy - half)..=(cy + half) {
            if y < margin || y > max_y {
                continue;
            }
            for x in (cx - half)..=(cx + half) {
                if x < margin || x > max_x {
                    continue;
                }
                let (row, col) = (y as usize, x as usize);
                let Some(old) = frame.get_pixel(row, col) else {
                    continue;
                };
                if frame.set_pixel(row, col, params.color.with_alpha(old.a)) {
                    painted += 1;
                }
            }
        }
    }
    painted
}
