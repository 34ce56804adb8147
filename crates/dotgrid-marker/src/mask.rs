use dotgrid_core::{FrameView, FrameViewMut};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::classify::ClassifierRule;

/// Per-frame foreground mask, row-major, one entry per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `false` outside the mask.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Clear a cell and report whether it was foreground.
    #[inline]
    pub(crate) fn take(&mut self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        std::mem::replace(&mut self.data[y * self.width + x], false)
    }

    /// First foreground cell at or after the row-major index `from`.
    pub(crate) fn next_set(&self, from: usize) -> Option<usize> {
        self.data
            .get(from..)?
            .iter()
            .position(|&v| v)
            .map(|i| from + i)
    }

    /// Number of foreground cells.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// `true` when no cell is foreground.
    pub fn is_clear(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }
}

/// Classify every pixel of `frame`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, rule), fields(width = frame.width(), height = frame.height()))
)]
pub fn classify_frame(frame: &FrameView<'_>, rule: &ClassifierRule) -> BinaryMask {
    let mut mask = BinaryMask::new(frame.width(), frame.height());
    for row in 0..frame.height() {
        for col in 0..frame.width() {
            if let Some(px) = frame.get_pixel(row, col) {
                mask.data[row * mask.width + col] = rule.is_foreground(px);
            }
        }
    }
    mask
}

/// Paint the mask onto a frame using the rule's inks.
///
/// Alpha is left untouched. Re-running [`classify_frame`] with the same rule on
/// the painted frame reproduces `mask`.
pub fn render_mask(mask: &BinaryMask, frame: &mut FrameViewMut<'_>, rule: &ClassifierRule) {
    let fg = rule.foreground_ink();
    let bg = rule.background_ink();
    let rows = mask.height.min(frame.height());
    let cols = mask.width.min(frame.width());
    for row in 0..rows {
        for col in 0..cols {
            let Some(old) = frame.get_pixel(row, col) else {
                continue;
            };
            let ink = if mask.get(col, row) { fg } else { bg };
            frame.set_pixel(row, col, ink.with_alpha(old.a));
        }
    }
}
