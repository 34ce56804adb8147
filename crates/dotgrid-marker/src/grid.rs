//! Occupancy-grid inference from marker centres.
//!
//! Markers are assumed to sit on an axis-aligned lattice. The lattice pitch is
//! either derived from the mean marker radius and a fixed physical spacing
//! expressed in radii ([`SpacingStrategy::RadiusRatio`]), or measured from the
//! smallest centre-to-centre gap ([`SpacingStrategy::Adaptive`]). Each marker is
//! then snapped to the nearest lattice cell relative to the top-left extent.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::validate::Marker;

/// Upper bound on `rows * cols`; larger grids are treated as degenerate.
const MAX_GRID_CELLS: usize = 1 << 20;

/// How lattice pitch is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpacingStrategy {
    /// Pitch = mean radius * `distance_in_radiuses_{h,v}`.
    #[default]
    RadiusRatio,
    /// Pitch = smallest per-axis centre gap strictly above `noise_floor_px`.
    Adaptive { noise_floor_px: i32 },
}

impl SpacingStrategy {
    pub const DEFAULT_NOISE_FLOOR_PX: i32 = 25;

    pub fn adaptive() -> Self {
        SpacingStrategy::Adaptive {
            noise_floor_px: Self::DEFAULT_NOISE_FLOOR_PX,
        }
    }
}

/// Grid inference parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Horizontal centre-to-centre spacing in marker radii.
    pub distance_in_radiuses_h: f64,
    /// Vertical centre-to-centre spacing in marker radii.
    pub distance_in_radiuses_v: f64,
    pub spacing: SpacingStrategy,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            distance_in_radiuses_h: 4.0,
            distance_in_radiuses_v: 3.0,
            spacing: SpacingStrategy::RadiusRatio,
        }
    }
}

/// Conversion from a pixel offset along one axis to a fractional cell index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisScale {
    RadiusRatio {
        avg_radius: f64,
        distance_in_radiuses: f64,
    },
    Pitch {
        pixels: f64,
    },
    /// Every offset maps to cell 0.
    Single,
}

impl AxisScale {
    #[inline]
    pub fn ratio(&self, offset: i32) -> f64 {
        let d = offset as f64;
        match *self {
            AxisScale::RadiusRatio {
                avg_radius,
                distance_in_radiuses,
            } => d / avg_radius / distance_in_radiuses,
            AxisScale::Pitch { pixels } => d / pixels,
            AxisScale::Single => 0.0,
        }
    }

    /// Nearest cell index, ties to even.
    #[inline]
    pub fn cells(&self, offset: i32) -> f64 {
        self.ratio(offset).round_ties_even()
    }
}

/// Smallest gap between sorted coordinates strictly greater than `floor`.
fn min_gap_above(mut coords: Vec<i32>, floor: i32) -> Option<i32> {
    coords.sort_unstable();
    let mut best: Option<i32> = None;
    for (i, &c) in coords.iter().enumerate() {
        let rest = &coords[i + 1..];
        let j = rest.partition_point(|&v| v - c <= floor);
        if let Some(&v) = rest.get(j) {
            let gap = v - c;
            best = Some(best.map_or(gap, |b| b.min(gap)));
        }
    }
    best
}

/// Marker presence per lattice cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<i32>>", try_from = "Vec<Vec<i32>>")]
pub struct OccupancyMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<i32>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("ragged occupancy matrix: row {row} has {got} cells, expected {expected}")]
pub struct MatrixShapeError {
    pub row: usize,
    pub expected: usize,
    pub got: usize,
}

impl OccupancyMatrix {
    pub const FILLED: i32 = -1;
    pub const EMPTY: i32 = 0;

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Self::EMPTY; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    #[inline]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Some(Self::FILLED)
    }

    /// Mark a cell as occupied; `false` when out of bounds.
    pub fn mark(&mut self, row: usize, col: usize) -> bool {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = Self::FILLED;
            true
        } else {
            false
        }
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == Self::FILLED).count()
    }

    pub fn row(&self, row: usize) -> Option<&[i32]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        (0..self.rows)
            .filter_map(|r| self.row(r).map(<[i32]>::to_vec))
            .collect()
    }
}

impl From<OccupancyMatrix> for Vec<Vec<i32>> {
    fn from(m: OccupancyMatrix) -> Self {
        m.to_rows()
    }
}

impl TryFrom<Vec<Vec<i32>>> for OccupancyMatrix {
    type Error = MatrixShapeError;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self, Self::Error> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixShapeError {
                    row: i,
                    expected: cols,
                    got: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }
}

impl fmt::Display for OccupancyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                write!(f, "{:>2} ", self.cells[r * self.cols + c])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Inferred lattice: occupancy plus the mapping that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub matrix: OccupancyMatrix,
    /// Top-left extent of the marker centres.
    pub min: Point2<i32>,
    /// Bottom-right extent of the marker centres.
    pub max: Point2<i32>,
    pub avg_radius: f64,
    pub horizontal: AxisScale,
    pub vertical: AxisScale,
}

impl GridLayout {
    /// `(row, col)` of a centre, or `None` if it falls outside the matrix.
    pub fn cell_of(&self, center: Point2<i32>) -> Option<(usize, usize)> {
        let col = self.horizontal.cells(center.x - self.min.x);
        let row = self.vertical.cells(center.y - self.min.y);
        if row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.matrix.rows() && col < self.matrix.cols()).then_some((row, col))
    }
}

fn axis_scale(
    spacing: SpacingStrategy,
    coords: impl Iterator<Item = i32>,
    avg_radius: f64,
    distance_in_radiuses: f64,
) -> AxisScale {
    match spacing {
        SpacingStrategy::RadiusRatio => AxisScale::RadiusRatio {
            avg_radius,
            distance_in_radiuses,
        },
        SpacingStrategy::Adaptive { noise_floor_px } => {
            match min_gap_above(coords.collect(), noise_floor_px) {
                Some(gap) => AxisScale::Pitch { pixels: gap as f64 },
                None => AxisScale::Single,
            }
        }
    }
}

/// Build the occupancy grid for `markers`.
///
/// Returns `None` with fewer than two markers, a zero mean radius, or a lattice
/// too large to be plausible.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(markers, params), fields(markers = markers.len()))
)]
pub fn infer_grid(markers: &[Marker], params: &GridParams) -> Option<GridLayout> {
    if markers.len() < 2 {
        return None;
    }

    // Integer mean, truncated, then widened.
    let radius_sum: i64 = markers.iter().map(|m| m.radius as i64).sum();
    let mean_radius = radius_sum / markers.len() as i64;
    if mean_radius <= 0 {
        log::debug!("grid: mean marker radius is zero");
        return None;
    }
    let avg_radius = mean_radius as f64;

    let mut min = markers[0].center;
    let mut max = markers[0].center;
    for m in &markers[1..] {
        min.x = min.x.min(m.center.x);
        min.y = min.y.min(m.center.y);
        max.x = max.x.max(m.center.x);
        max.y = max.y.max(m.center.y);
    }

    let horizontal = axis_scale(
        params.spacing,
        markers.iter().map(|m| m.center.x),
        avg_radius,
        params.distance_in_radiuses_h,
    );
    let vertical = axis_scale(
        params.spacing,
        markers.iter().map(|m| m.center.y),
        avg_radius,
        params.distance_in_radiuses_v,
    );

    let cols = horizontal.cells(max.x - min.x) + 1.0;
    let rows = vertical.cells(max.y - min.y) + 1.0;
    if !(cols.is_finite() && rows.is_finite()) || cols * rows > MAX_GRID_CELLS as f64 {
        log::debug!("grid: implausible lattice {rows} x {cols}");
        return None;
    }

    let mut layout = GridLayout {
        matrix: OccupancyMatrix::zeros(rows as usize, cols as usize),
        min,
        max,
        avg_radius,
        horizontal,
        vertical,
    };

    for m in markers {
        match layout.cell_of(m.center) {
            Some((row, col)) => {
                layout.matrix.mark(row, col);
            }
            None => log::debug!(
                "grid: marker at ({}, {}) maps outside {} x {}",
                m.center.x,
                m.center.y,
                layout.matrix.rows(),
                layout.matrix.cols()
            ),
        }
    }

    log::trace!(
        "grid: {} x {} from {} markers, mean radius {:.2}",
        layout.matrix.rows(),
        layout.matrix.cols(),
        markers.len(),
        avg_radius
    );
    Some(layout)
}
