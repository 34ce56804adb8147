//! High-level facade crate for the `dotgrid-*` workspace.
//!
//! This crate provides:
//! - re-exports of the frame types and the marker grid detector
//! - JSON configuration and report helpers ([`io`])
//! - (feature-gated) helpers that run the detector on `image::RgbaImage` values
//!
//! ## Quickstart
//!
//! ```no_run
//! use dotgrid::detect;
//! use dotgrid::DetectorParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::ImageReader::open("frame.png")?.decode()?.to_rgba8();
//! let result = detect::detect_image(&img, &DetectorParams::default())?;
//! println!("markers: {}", result.marker_count());
//! if let Some(matrix) = result.matrix() {
//!     print!("{matrix}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `dotgrid::core`: frame views over BGRA buffers, logger setup.
//! - `dotgrid::marker`: classification, blobs, markers, grid inference.
//! - `dotgrid::io`: JSON config and detection report.
//! - `dotgrid::detect` (feature `image`): helpers over `image::RgbaImage`.

pub use dotgrid_core as core;
pub use dotgrid_marker as marker;

pub use dotgrid_core::{Bgra, FrameView, FrameViewMut, PixelFormat};
pub use dotgrid_marker::{
    ClassifierRule, DetectionResult, DetectorParams, FrameState, Marker, MarkerGridDetector,
    OccupancyMatrix,
};
pub use nalgebra::Point2;

pub mod io;

#[cfg(feature = "image")]
pub mod detect;
