//! Views over caller-owned video frames.
//!
//! A frame is a contiguous buffer of `height` rows, each `stride` bytes long,
//! of which the first `width * bytes_per_pixel` bytes hold pixels. All pixel
//! access in the workspace goes through [`FrameView::get_pixel`] and
//! [`FrameViewMut::set_pixel`]; nothing else computes buffer offsets.

use serde::{Deserialize, Serialize};

/// Pixel layout tag attached to every frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 4 bytes per pixel in B, G, R, A order.
    Bgra8,
    /// 4 bytes per pixel in R, G, B, A order.
    Rgba8,
    /// 1 byte per pixel.
    Gray8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One pixel, channel order B, G, R, A.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Bgra {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra {
    pub const BLACK: Bgra = Bgra::from_rgb(0, 0, 0);
    pub const WHITE: Bgra = Bgra::from_rgb(255, 255, 255);
    pub const RED: Bgra = Bgra::from_rgb(255, 0, 0);

    #[inline]
    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Opaque pixel from RGB components.
    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    /// Same colour with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Errors raised when a buffer does not match the layout it is described with.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("row stride of {stride} bytes is shorter than one row of pixels ({row_bytes} bytes)")]
    StrideTooSmall { stride: usize, row_bytes: usize },

    #[error("frame buffer too short (expected at least {expected} bytes, got {got})")]
    BufferTooShort { expected: usize, got: usize },
}

/// Geometry of a frame buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameLayout {
    pub width: usize,
    pub height: usize,
    /// Bytes from the start of one row to the start of the next.
    pub stride: usize,
    pub format: PixelFormat,
}

impl FrameLayout {
    pub fn new(width: usize, height: usize, stride: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            stride,
            format,
        }
    }

    /// Layout without row padding.
    pub fn packed(width: usize, height: usize, format: PixelFormat) -> Self {
        Self::new(width, height, width * format.bytes_per_pixel(), format)
    }

    #[inline]
    fn row_bytes(&self) -> usize {
        self.width * self.format.bytes_per_pixel()
    }

    /// Minimum buffer length for this layout. The last row may omit its padding.
    pub fn required_len(&self) -> usize {
        if self.height == 0 {
            return 0;
        }
        self.stride * (self.height - 1) + self.row_bytes()
    }

    /// Check that a buffer of `len` bytes can back this layout.
    pub fn validate(&self, len: usize) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = self
            .width
            .checked_mul(self.format.bytes_per_pixel())
            .ok_or(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.stride < row_bytes {
            return Err(FrameError::StrideTooSmall {
                stride: self.stride,
                row_bytes,
            });
        }
        let expected = self
            .stride
            .checked_mul(self.height - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if len < expected {
            return Err(FrameError::BufferTooShort { expected, got: len });
        }
        Ok(())
    }

    /// Byte offset of pixel `(row, col)`, or `None` outside the frame.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.stride * row + self.format.bytes_per_pixel() * col)
    }
}

#[inline]
fn read_pixel(data: &[u8], format: PixelFormat, at: usize) -> Bgra {
    match format {
        PixelFormat::Bgra8 => Bgra::new(data[at], data[at + 1], data[at + 2], data[at + 3]),
        PixelFormat::Rgba8 => Bgra::new(data[at + 2], data[at + 1], data[at], data[at + 3]),
        PixelFormat::Gray8 => {
            let v = data[at];
            Bgra::new(v, v, v, 255)
        }
    }
}

#[inline]
fn write_pixel(data: &mut [u8], format: PixelFormat, at: usize, px: Bgra) {
    match format {
        PixelFormat::Bgra8 => data[at..at + 4].copy_from_slice(&[px.b, px.g, px.r, px.a]),
        PixelFormat::Rgba8 => data[at..at + 4].copy_from_slice(&[px.r, px.g, px.b, px.a]),
        PixelFormat::Gray8 => {
            let luma = 0.299 * px.r as f32 + 0.587 * px.g as f32 + 0.114 * px.b as f32 + 0.5;
            data[at] = luma.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Read-only view over a frame buffer.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    layout: FrameLayout,
    data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(data: &'a [u8], layout: FrameLayout) -> Result<Self, FrameError> {
        layout.validate(data.len())?;
        Ok(Self { layout, data })
    }

    /// BGRA8 view with an explicit row stride.
    pub fn bgra(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, FrameError> {
        Self::new(
            data,
            FrameLayout::new(width, height, stride, PixelFormat::Bgra8),
        )
    }

    #[inline]
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.layout.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.layout.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    #[inline]
    pub fn get_pixel(&self, row: usize, col: usize) -> Option<Bgra> {
        let at = self.layout.offset(row, col)?;
        Some(read_pixel(self.data, self.layout.format, at))
    }
}

/// Exclusive view over a frame buffer.
///
/// Holding this view is what gives a caller sole access to the pixels for the
/// duration of a processing call.
#[derive(Debug)]
pub struct FrameViewMut<'a> {
    layout: FrameLayout,
    data: &'a mut [u8],
}

impl<'a> FrameViewMut<'a> {
    pub fn new(data: &'a mut [u8], layout: FrameLayout) -> Result<Self, FrameError> {
        layout.validate(data.len())?;
        Ok(Self { layout, data })
    }

    pub fn bgra(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, FrameError> {
        Self::new(
            data,
            FrameLayout::new(width, height, stride, PixelFormat::Bgra8),
        )
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_view(&self) -> FrameView<'_> {
        FrameView {
            layout: self.layout,
            data: self.data,
        }
    }

    #[inline]
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.layout.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.layout.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    #[inline]
    pub fn get_pixel(&self, row: usize, col: usize) -> Option<Bgra> {
        let at = self.layout.offset(row, col)?;
        Some(read_pixel(self.data, self.layout.format, at))
    }

    /// Write one pixel. Returns `false` (and writes nothing) outside the frame.
    #[inline]
    pub fn set_pixel(&mut self, row: usize, col: usize, px: Bgra) -> bool {
        let Some(at) = self.layout.offset(row, col) else {
            return false;
        };
        write_pixel(self.data, self.layout.format, at, px);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_accepts_exact_buffer() {
        let data = vec![0u8; 3 * 2 * 4];
        let view = FrameView::bgra(&data, 3, 2, 12).expect("valid frame");
        assert_eq!(view.width(), 3);
        assert_eq!(view.height(), 2);
        assert_eq!(view.format(), PixelFormat::Bgra8);
        assert_eq!(view.layout().stride, 12);
    }

    #[test]
    fn last_row_padding_may_be_missing() {
        let layout = FrameLayout::new(2, 3, 16, PixelFormat::Bgra8);
        assert_eq!(layout.required_len(), 16 * 2 + 8);
        let data = vec![0u8; 40];
        assert!(FrameView::new(&data, layout).is_ok());
    }

    #[test]
    fn rejects_short_buffer() {
        let data = vec![0u8; 10];
        let err = FrameView::bgra(&data, 2, 2, 8).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferTooShort {
                expected: 16,
                got: 10
            }
        );
    }

    #[test]
    fn rejects_narrow_stride_and_empty_frames() {
        let data = vec![0u8; 64];
        assert_eq!(
            FrameView::bgra(&data, 4, 2, 8).unwrap_err(),
            FrameError::StrideTooSmall {
                stride: 8,
                row_bytes: 16
            }
        );
        assert_eq!(
            FrameView::bgra(&data, 0, 2, 8).unwrap_err(),
            FrameError::InvalidDimensions {
                width: 0,
                height: 2
            }
        );
    }

    #[test]
    fn pixel_access_uses_stride_and_channel_order() {
        let mut data = vec![0u8; 2 * 12];
        {
            let mut frame = FrameViewMut::bgra(&mut data, 2, 2, 12).expect("frame");
            assert!(frame.set_pixel(1, 1, Bgra::new(1, 2, 3, 4)));
            assert!(!frame.set_pixel(2, 0, Bgra::WHITE));
            assert!(!frame.set_pixel(0, 2, Bgra::WHITE));
        }
        assert_eq!(&data[16..20], &[1, 2, 3, 4]);

        let view = FrameView::bgra(&data, 2, 2, 12).expect("frame");
        assert_eq!(view.get_pixel(1, 1), Some(Bgra::new(1, 2, 3, 4)));
        assert_eq!(view.get_pixel(0, 2), None);
    }

    #[test]
    fn rgba_frames_are_swizzled() {
        let data = [10u8, 20, 30, 40];
        let view = FrameView::new(&data, FrameLayout::packed(1, 1, PixelFormat::Rgba8))
            .expect("frame");
        assert_eq!(view.get_pixel(0, 0), Some(Bgra::new(30, 20, 10, 40)));
    }

    #[test]
    fn red_is_red() {
        assert_eq!(Bgra::RED, Bgra::new(0, 0, 255, 255));
        assert_eq!(Bgra::RED.with_alpha(7).a, 7);
    }
}
