//! Per-pixel foreground/background classification.
//!
//! Two interchangeable rules are supported: a luma threshold with a
//! configurable polarity, and a hue + value gate for coloured markers.
//! Classification itself never touches the frame; painting the decision back
//! onto a frame is [`crate::render_mask`].

use dotgrid_core::Bgra;
use serde::{Deserialize, Serialize};

/// Which side of a luma threshold counts as foreground.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LumaPolarity {
    /// Foreground iff `luma > threshold * 255` (light markers on a dark board).
    #[default]
    Bright,
    /// Foreground iff `luma <= threshold * 255` (dark markers on a light board).
    Dark,
}

/// Foreground decision rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ClassifierRule {
    /// Threshold on `0.299 R + 0.587 G + 0.114 B`.
    Luminance {
        /// Fraction of full scale, in `(0, 1]`.
        threshold: f64,
        #[serde(default)]
        polarity: LumaPolarity,
    },
    /// Foreground iff `hue > hue_cutoff && value > threshold`.
    HueValue {
        /// HSV value gate, in `(0, 1]`.
        threshold: f64,
        /// Hue in degrees, in `[0, 360)`.
        hue_cutoff: u16,
    },
}

impl Default for ClassifierRule {
    fn default() -> Self {
        ClassifierRule::HueValue {
            threshold: 0.85,
            hue_cutoff: 330,
        }
    }
}

impl ClassifierRule {
    pub fn luminance(threshold: f64, polarity: LumaPolarity) -> Self {
        ClassifierRule::Luminance {
            threshold,
            polarity,
        }
    }

    pub fn hue_value(threshold: f64, hue_cutoff: u16) -> Self {
        ClassifierRule::HueValue {
            threshold,
            hue_cutoff,
        }
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        match *self {
            ClassifierRule::Luminance { threshold, .. } => threshold,
            ClassifierRule::HueValue { threshold, .. } => threshold,
        }
    }

    /// Classify one pixel. Alpha is ignored.
    #[inline]
    pub fn is_foreground(&self, px: Bgra) -> bool {
        match *self {
            ClassifierRule::Luminance {
                threshold,
                polarity,
            } => {
                let l = luma(px) as f64;
                let cut = threshold * 255.0;
                match polarity {
                    LumaPolarity::Bright => l > cut,
                    LumaPolarity::Dark => l <= cut,
                }
            }
            ClassifierRule::HueValue {
                threshold,
                hue_cutoff,
            } => {
                let (hue, value) = hue_value(px);
                hue > hue_cutoff as f64 && value > threshold
            }
        }
    }

    /// Colour that this rule classifies as foreground.
    ///
    /// Used when painting a mask back onto a frame, so that classifying the
    /// painted frame again yields the same mask.
    pub fn foreground_ink(&self) -> Bgra {
        match *self {
            ClassifierRule::Luminance {
                polarity: LumaPolarity::Bright,
                ..
            } => Bgra::WHITE,
            ClassifierRule::Luminance {
                polarity: LumaPolarity::Dark,
                ..
            } => Bgra::BLACK,
            ClassifierRule::HueValue { hue_cutoff, .. } => {
                saturated(0.5 * (hue_cutoff as f64 + 360.0))
            }
        }
    }

    /// Colour that this rule classifies as background.
    pub fn background_ink(&self) -> Bgra {
        match *self {
            ClassifierRule::Luminance {
                polarity: LumaPolarity::Dark,
                ..
            } => Bgra::WHITE,
            _ => Bgra::BLACK,
        }
    }
}

/// Rounded BT.601 luma of a pixel.
#[inline]
pub fn luma(px: Bgra) -> u8 {
    (px.r as f64 * 0.299 + px.g as f64 * 0.587 + px.b as f64 * 0.114 + 0.5) as u8
}

/// HSV hue in degrees `[0, 360)` and value in `[0, 1]`.
///
/// Achromatic pixels report hue `0`.
pub fn hue_value(px: Bgra) -> (f64, f64) {
    let r = px.r as f64 / 255.0;
    let g = px.g as f64 / 255.0;
    let b = px.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta <= 0.0 {
        return (0.0, max);
    }

    let sector = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let mut hue = sector * 60.0;
    if hue < 0.0 {
        hue += 360.0;
    }
    (hue, max)
}

/// Fully saturated, full-value colour of the given hue.
fn saturated(hue: f64) -> Bgra {
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    Bgra::from_rgb(byte(r), byte(g), byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn luma_matches_bt601_weights() {
        assert_eq!(luma(Bgra::WHITE), 255);
        assert_eq!(luma(Bgra::BLACK), 0);
        assert_eq!(luma(Bgra::from_rgb(255, 0, 0)), 76);
        assert_eq!(luma(Bgra::from_rgb(0, 255, 0)), 150);
        assert_eq!(luma(Bgra::from_rgb(0, 0, 255)), 29);
    }

    #[test]
    fn luminance_polarity_flips_the_decision() {
        let bright = ClassifierRule::luminance(0.5, LumaPolarity::Bright);
        let dark = ClassifierRule::luminance(0.5, LumaPolarity::Dark);
        let light_grey = Bgra::from_rgb(200, 200, 200);
        let dark_grey = Bgra::from_rgb(40, 40, 40);

        assert!(bright.is_foreground(light_grey));
        assert!(!bright.is_foreground(dark_grey));
        assert!(!dark.is_foreground(light_grey));
        assert!(dark.is_foreground(dark_grey));
    }

    #[test]
    fn luminance_threshold_is_inclusive_for_dark() {
        // 0.5 * 255 = 127.5; luma 127 is dark, 128 is bright.
        let dark = ClassifierRule::luminance(0.5, LumaPolarity::Dark);
        assert!(dark.is_foreground(Bgra::from_rgb(127, 127, 127)));
        assert!(!dark.is_foreground(Bgra::from_rgb(128, 128, 128)));

        let full = ClassifierRule::luminance(1.0, LumaPolarity::Dark);
        assert!(full.is_foreground(Bgra::WHITE));
    }

    #[test]
    fn hue_value_of_primaries() {
        let (h, v) = hue_value(Bgra::from_rgb(255, 0, 0));
        assert_abs_diff_eq!(h, 0.0);
        assert_abs_diff_eq!(v, 1.0);
        let (h, _) = hue_value(Bgra::from_rgb(0, 255, 0));
        assert_abs_diff_eq!(h, 120.0);
        let (h, _) = hue_value(Bgra::from_rgb(0, 0, 255));
        assert_abs_diff_eq!(h, 240.0);
        let (h, v) = hue_value(Bgra::from_rgb(128, 128, 128));
        assert_abs_diff_eq!(h, 0.0);
        assert_abs_diff_eq!(v, 128.0 / 255.0, epsilon = 1e-12);
    }

    #[test]
    fn hue_value_rule_picks_magenta_red() {
        let rule = ClassifierRule::default();
        // Hue ~ 340 deg, bright.
        assert!(rule.is_foreground(Bgra::from_rgb(255, 0, 85)));
        // Hue ~ 340 deg but too dark.
        assert!(!rule.is_foreground(Bgra::from_rgb(120, 0, 40)));
        // Pure red has hue 0.
        assert!(!rule.is_foreground(Bgra::from_rgb(255, 0, 0)));
        assert!(!rule.is_foreground(Bgra::WHITE));
    }

    #[test]
    fn inks_round_trip_through_the_rule() {
        let rules = [
            ClassifierRule::luminance(0.5, LumaPolarity::Bright),
            ClassifierRule::luminance(0.3, LumaPolarity::Dark),
            ClassifierRule::hue_value(0.85, 330),
            ClassifierRule::hue_value(0.5, 0),
            ClassifierRule::hue_value(0.99, 359),
        ];
        for rule in rules {
            assert!(rule.is_foreground(rule.foreground_ink()), "{rule:?}");
            assert!(!rule.is_foreground(rule.background_ink()), "{rule:?}");
        }
    }

    #[test]
    fn rule_serializes_with_tag() {
        let rule = ClassifierRule::luminance(0.5, LumaPolarity::Dark);
        let json = serde_json::to_string(&rule).expect("serialize");
        assert_eq!(
            json,
            r#"{"rule":"luminance","threshold":0.5,"polarity":"dark"}"#
        );
        let back: ClassifierRule =
            serde_json::from_str(r#"{"rule":"luminance","threshold":0.7}"#).expect("parse");
        assert_eq!(back, ClassifierRule::luminance(0.7, LumaPolarity::Bright));
    }
}
