//! Per-frame marker grid detection pipeline.
//!
//! This module wires together pixel classification, blob extraction, marker
//! validation, grid inference and the optional debug overlay. Cross-frame
//! state is an explicit [`FrameState`] passed in and returned by the caller.

mod error;
mod params;
mod pipeline;
mod result;
mod state;

pub use error::ParamsError;
pub use params::DetectorParams;
pub use pipeline::{detect_markers, MarkerGridDetector};
pub use result::DetectionResult;
pub use state::FrameState;
