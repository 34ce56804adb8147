//! Size and shape gates that turn blobs into markers.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::blob::Blob;

/// Thresholds applied to every extracted blob.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobFilterParams {
    /// A blob is too small only if it has fewer pixels than this *and* a
    /// radius below `min_radius`.
    pub min_pixel_count: usize,
    pub min_radius: i32,
    /// Lower bound on `span_y / span_x`.
    pub min_proportion: f64,
    /// Upper bound on `span_y / span_x`.
    pub max_proportion: f64,
}

impl Default for BlobFilterParams {
    fn default() -> Self {
        Self {
            min_pixel_count: 100,
            min_radius: 25,
            min_proportion: 0.2,
            max_proportion: 3.0,
        }
    }
}

/// A validated circular fiducial.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Marker {
    /// Bounding-box midpoint in pixel coordinates.
    pub center: Point2<i32>,
    pub radius: i32,
}

/// Why a blob did not become a marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    TooSmall { pixel_count: usize, radius: i32 },
    /// Zero-width bounding box; the aspect ratio is undefined.
    ZeroWidth,
    Elongated { proportion: f64 },
}

/// Integer radius estimate: mean of the half spans, each truncated.
#[inline]
pub fn blob_radius(blob: &Blob) -> i32 {
    let half_y = blob.span_y() as i32 / 2;
    let half_x = blob.span_x() as i32 / 2;
    (half_y + half_x) / 2
}

/// Accept or reject a blob.
pub fn judge_blob(blob: &Blob, params: &BlobFilterParams) -> Result<Marker, Rejection> {
    let radius = blob_radius(blob);
    if blob.pixel_count < params.min_pixel_count && radius < params.min_radius {
        return Err(Rejection::TooSmall {
            pixel_count: blob.pixel_count,
            radius,
        });
    }

    if blob.span_x() == 0 {
        return Err(Rejection::ZeroWidth);
    }
    let proportion = blob.span_y() as f64 / blob.span_x() as f64;
    if proportion > params.max_proportion || proportion < params.min_proportion {
        return Err(Rejection::Elongated { proportion });
    }

    let cx = (blob.min_x + blob.max_x) / 2;
    let cy = (blob.min_y + blob.max_y) / 2;
    Ok(Marker {
        center: Point2::new(cx as i32, cy as i32),
        radius,
    })
}

/// [`judge_blob`] without the reason.
#[inline]
pub fn marker_from_blob(blob: &Blob, params: &BlobFilterParams) -> Option<Marker> {
    judge_blob(blob, params).ok()
}
