//! Core types for dot-grid marker detection.
//!
//! This crate is intentionally small. It provides bounds-checked views over
//! caller-owned pixel buffers and the logger setup shared by the workspace.
//! It does *not* know anything about markers or grids.

mod frame;
mod logger;

pub use frame::{Bgra, FrameError, FrameLayout, FrameView, FrameViewMut, PixelFormat};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
