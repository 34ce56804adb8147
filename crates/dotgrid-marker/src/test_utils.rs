//! Synthetic BGRA frames for unit tests.

use dotgrid_core::{Bgra, FrameView, FrameViewMut};

/// Owned BGRA8 buffer with an explicit stride.
pub(crate) struct TestFrame {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub data: Vec<u8>,
}

impl TestFrame {
    pub fn filled(width: usize, height: usize, px: Bgra) -> Self {
        Self::with_stride(width, height, width * 4, px)
    }

    /// Padding bytes are set to `0xAB` so stray reads show up.
    pub fn with_stride(width: usize, height: usize, stride: usize, px: Bgra) -> Self {
        let mut frame = Self {
            width,
            height,
            stride,
            data: vec![0xAB; stride * height],
        };
        frame.fill_rect(0, 0, width - 1, height - 1, px);
        frame
    }

    pub fn put(&mut self, x: usize, y: usize, px: Bgra) {
        let at = y * self.stride + 4 * x;
        self.data[at..at + 4].copy_from_slice(&[px.b, px.g, px.r, px.a]);
    }

    /// Inclusive corners.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, px: Bgra) {
        for y in y0..=y1.min(self.height - 1) {
            for x in x0..=x1.min(self.width - 1) {
                self.put(x, y, px);
            }
        }
    }

    /// Solid disk `dx^2 + dy^2 <= r^2`, clipped to the frame.
    pub fn fill_disk(&mut self, cx: i64, cy: i64, r: i64, px: Bgra) {
        for y in (cy - r).max(0)..=(cy + r).min(self.height as i64 - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(self.width as i64 - 1) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.put(x as usize, y as usize, px);
                }
            }
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView::bgra(&self.data, self.width, self.height, self.stride).expect("test frame")
    }

    pub fn view_mut(&mut self) -> FrameViewMut<'_> {
        FrameViewMut::bgra(&mut self.data, self.width, self.height, self.stride)
            .expect("test frame")
    }
}
