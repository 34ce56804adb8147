//! Circular marker detection and occupancy-grid inference on BGRA frames.
//!
//! Pipeline, one frame at a time:
//! - classify every pixel as foreground or background ([`ClassifierRule`]),
//! - flood-fill 8-connected foreground regions into blobs ([`extract_blobs`]),
//! - keep blobs that pass the size and shape gates ([`judge_blob`]),
//! - snap marker centres onto a lattice and build the occupancy matrix
//!   ([`infer_grid`]), where `-1` marks a cell holding a marker.
//!
//! [`MarkerGridDetector`] runs the whole chain. The frame is only written to
//! by the optional debug steps ([`render_mask`], [`annotate_markers`]).
//!
//! ```no_run
//! use dotgrid_core::FrameView;
//! use dotgrid_marker::{DetectorParams, FrameState, MarkerGridDetector};
//!
//! # fn run(buffer: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let detector = MarkerGridDetector::new(DetectorParams::default())?;
//! let frame = FrameView::bgra(buffer, 640, 480, 640 * 4)?;
//! let result = detector.detect(&frame);
//! if let Some(matrix) = result.matrix() {
//!     print!("{matrix}");
//! }
//! # let _ = FrameState::default();
//! # Ok(())
//! # }
//! ```

mod annotate;
mod blob;
mod classify;
mod detector;
mod grid;
mod mask;
mod validate;

#[cfg(test)]
mod test_utils;

pub use annotate::{annotate_markers, OverlayParams};
pub use blob::{extract_blobs, Blob, Blobs};
pub use classify::{hue_value, luma, ClassifierRule, LumaPolarity};
pub use detector::{
    detect_markers, DetectionResult, DetectorParams, FrameState, MarkerGridDetector, ParamsError,
};
pub use grid::{
    infer_grid, AxisScale, GridLayout, GridParams, MatrixShapeError, OccupancyMatrix,
    SpacingStrategy,
};
pub use mask::{classify_frame, render_mask, BinaryMask};
pub use validate::{blob_radius, judge_blob, marker_from_blob, BlobFilterParams, Marker, Rejection};
