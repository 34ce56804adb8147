use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::grid::{GridLayout, OccupancyMatrix};
use crate::validate::Marker;

/// Output of one detection pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Accepted markers in scan order.
    pub markers: Vec<Marker>,
    /// Present when at least two markers with a non-zero mean radius were found.
    pub grid: Option<GridLayout>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Marker centres in scan order.
    pub fn centers(&self) -> Vec<Point2<i32>> {
        self.markers.iter().map(|m| m.center).collect()
    }

    pub fn matrix(&self) -> Option<&OccupancyMatrix> {
        self.grid.as_ref().map(|g| &g.matrix)
    }
}
