use serde::{Deserialize, Serialize};

use super::ParamsError;
use crate::annotate::OverlayParams;
use crate::classify::ClassifierRule;
use crate::grid::{GridParams, SpacingStrategy};
use crate::validate::BlobFilterParams;

/// Configuration for [`super::MarkerGridDetector`].
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Foreground rule applied to every pixel.
    pub classifier: ClassifierRule,
    /// Size and shape gates for blobs.
    pub blob_filter: BlobFilterParams,
    /// Lattice spacing for the occupancy matrix.
    pub grid: GridParams,
    /// Debug overlay style.
    pub overlay: OverlayParams,
    /// Paint overlay squares in [`super::MarkerGridDetector::process_frame`].
    pub annotate: bool,
    /// Replace the frame with the classified mask before annotating.
    pub render_mask: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            classifier: ClassifierRule::default(),
            blob_filter: BlobFilterParams::default(),
            grid: GridParams::default(),
            overlay: OverlayParams::default(),
            annotate: true,
            render_mask: false,
        }
    }
}

impl DetectorParams {
    /// Check ranges that would make detection meaningless.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let threshold = self.classifier.threshold();
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ParamsError::Threshold(threshold));
        }
        if let ClassifierRule::HueValue { hue_cutoff, .. } = self.classifier {
            if hue_cutoff >= 360 {
                return Err(ParamsError::HueCutoff(hue_cutoff));
            }
        }

        let (horizontal, vertical) = (
            self.grid.distance_in_radiuses_h,
            self.grid.distance_in_radiuses_v,
        );
        if !(horizontal > 0.0 && vertical > 0.0 && horizontal.is_finite() && vertical.is_finite())
        {
            return Err(ParamsError::Spacing {
                horizontal,
                vertical,
            });
        }
        if let SpacingStrategy::Adaptive { noise_floor_px } = self.grid.spacing {
            if noise_floor_px < 0 {
                return Err(ParamsError::NoiseFloor(noise_floor_px));
            }
        }

        let (min, max) = (
            self.blob_filter.min_proportion,
            self.blob_filter.max_proportion,
        );
        if !(min > 0.0 && min <= max) {
            return Err(ParamsError::Proportion { min, max });
        }
        Ok(())
    }
}
