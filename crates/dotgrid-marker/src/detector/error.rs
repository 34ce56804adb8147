/// Configuration rejected by [`super::MarkerGridDetector::new`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParamsError {
    #[error("classifier threshold {0} outside (0, 1]")]
    Threshold(f64),
    #[error("hue cutoff {0} outside [0, 360)")]
    HueCutoff(u16),
    #[error("grid spacing must be positive (horizontal={horizontal}, vertical={vertical})")]
    Spacing { horizontal: f64, vertical: f64 },
    #[error("proportion bounds must satisfy 0 < min <= max (min={min}, max={max})")]
    Proportion { min: f64, max: f64 },
    #[error("adaptive noise floor {0} is negative")]
    NoiseFloor(i32),
}
