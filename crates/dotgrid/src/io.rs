//! JSON configuration and report helpers for dot-grid detection.

use crate::marker::{
    DetectionResult, DetectorParams, GridLayout, Marker, MarkerGridDetector, OccupancyMatrix,
    ParamsError,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DotgridConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub annotated_path: Option<String>,
    #[serde(default)]
    pub mask_path: Option<String>,
    #[serde(default)]
    pub detector: DetectorParams,
}

impl DotgridConfig {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_path.as_ref().map(PathBuf::from)
    }

    pub fn annotated_path(&self) -> Option<PathBuf> {
        self.annotated_path.as_ref().map(PathBuf::from)
    }

    pub fn mask_path(&self) -> Option<PathBuf> {
        self.mask_path.as_ref().map(PathBuf::from)
    }

    /// Build a detector from the `detector` section.
    pub fn build_detector(&self) -> Result<MarkerGridDetector, ParamsError> {
        MarkerGridDetector::new(self.detector.clone())
    }
}

/// Machine-readable outcome of one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub image_path: String,
    #[serde(default)]
    pub config_path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub detector: DetectorParams,
    pub marker_count: usize,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub matrix: Option<OccupancyMatrix>,
    #[serde(default)]
    pub grid: Option<GridLayout>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectionReport {
    /// Build an empty report for an input image.
    pub fn new(cfg: &DotgridConfig, config_path: Option<&Path>, width: u32, height: u32) -> Self {
        Self {
            image_path: cfg.image_path.clone(),
            config_path: config_path.map(|p| p.to_string_lossy().into_owned()),
            width,
            height,
            detector: cfg.detector.clone(),
            marker_count: 0,
            markers: Vec::new(),
            matrix: None,
            grid: None,
            error: None,
        }
    }

    /// Populate report fields from a detection pass.
    pub fn set_detection(&mut self, res: DetectionResult) {
        self.marker_count = res.marker_count();
        self.matrix = res.matrix().cloned();
        self.markers = res.markers;
        self.grid = res.grid;
        self.error = None;
    }

    /// Record an error instead of a detection.
    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
