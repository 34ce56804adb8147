use crate::{core, marker};
use ::image::RgbaImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid BGRA buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Frame(#[from] core::FrameError),

    #[error(transparent)]
    Params(#[from] marker::ParamsError),
}

/// Copy an RGBA image into a packed BGRA buffer.
pub fn frame_from_rgba(img: &RgbaImage) -> Vec<u8> {
    let mut out = img.as_raw().clone();
    for px in out.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    out
}

/// Build an RGBA image from a packed BGRA buffer.
pub fn rgba_from_frame(width: u32, height: u32, bgra: &[u8]) -> Result<RgbaImage, DetectError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(DetectError::InvalidDimensions { width, height })?;
    if bgra.len() != expected {
        return Err(DetectError::InvalidBuffer {
            expected,
            got: bgra.len(),
        });
    }
    let mut raw = bgra.to_vec();
    for px in raw.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    RgbaImage::from_raw(width, height, raw).ok_or(DetectError::InvalidDimensions { width, height })
}

fn frame_view<'a>(img: &RgbaImage, bgra: &'a [u8]) -> Result<core::FrameView<'a>, DetectError> {
    let width = img.width() as usize;
    Ok(core::FrameView::bgra(
        bgra,
        width,
        img.height() as usize,
        width * 4,
    )?)
}

/// Run the detector on an image without modifying it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    img: &RgbaImage,
    params: &marker::DetectorParams,
) -> Result<marker::DetectionResult, DetectError> {
    let bgra = frame_from_rgba(img);
    let frame = frame_view(img, &bgra)?;
    Ok(marker::detect_markers(&frame, params)?)
}

/// Run a full frame pass and return the painted copy.
///
/// Overlay squares are always drawn; the mask is rendered underneath when
/// `params.render_mask` is set.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn annotate_image(
    img: &RgbaImage,
    params: &marker::DetectorParams,
) -> Result<(marker::DetectionResult, RgbaImage), DetectError> {
    let detector = marker::MarkerGridDetector::new(marker::DetectorParams {
        annotate: true,
        ..params.clone()
    })?;

    let mut bgra = frame_from_rgba(img);
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut frame = core::FrameViewMut::bgra(&mut bgra, width, height, width * 4)?;
    let (result, _) = detector.process_frame(&mut frame, marker::FrameState::default());

    let painted = rgba_from_frame(img.width(), img.height(), &bgra)?;
    Ok((result, painted))
}

/// Classify an image and render the mask with the rule's inks.
pub fn mask_image(
    img: &RgbaImage,
    params: &marker::DetectorParams,
) -> Result<RgbaImage, DetectError> {
    params.validate()?;
    let mut bgra = frame_from_rgba(img);
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mask = marker::classify_frame(&frame_view(img, &bgra)?, &params.classifier);
    let mut frame = core::FrameViewMut::bgra(&mut bgra, width, height, width * 4)?;
    marker::render_mask(&mask, &mut frame, &params.classifier);
    log::debug!("mask: {} foreground pixels", mask.count());
    rgba_from_frame(img.width(), img.height(), &bgra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::Rgba;
    use marker::{ClassifierRule, DetectorParams, LumaPolarity};

    fn disks(width: u32, height: u32, centers: &[(i64, i64)], r: i64) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let inside = centers.iter().any(|&(cx, cy)| {
                let (dx, dy) = (x as i64 - cx, y as i64 - cy);
                dx * dx + dy * dy <= r * r
            });
            if inside {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn luminance() -> DetectorParams {
        DetectorParams {
            classifier: ClassifierRule::luminance(0.5, LumaPolarity::Bright),
            ..DetectorParams::default()
        }
    }

    #[test]
    fn channel_order_round_trips() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 40]));
        let bgra = frame_from_rgba(&img);
        assert_eq!(&bgra[..4], &[30, 20, 10, 40]);
        let back = rgba_from_frame(2, 1, &bgra).expect("image");
        assert_eq!(back, img);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = rgba_from_frame(4, 4, &[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            DetectError::InvalidBuffer {
                expected: 64,
                got: 10
            }
        ));
    }

    #[test]
    fn detects_disks_in_an_image() {
        let img = disks(320, 200, &[(60, 60), (180, 60), (60, 150)], 30);
        let result = detect_image(&img, &luminance()).expect("detect");
        assert_eq!(result.marker_count(), 3);
        let matrix = result.matrix().expect("matrix");
        assert_eq!(matrix.to_rows(), vec![vec![-1, -1], vec![-1, 0]]);
    }

    #[test]
    fn annotate_paints_red_centres() {
        let img = disks(200, 200, &[(100, 100)], 30);
        let (result, painted) = annotate_image(&img, &luminance()).expect("annotate");
        assert_eq!(result.marker_count(), 1);
        assert_eq!(painted.get_pixel(100, 100), &Rgba([255, 0, 0, 255]));
        assert_eq!(painted.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        // Input is untouched.
        assert_eq!(img.get_pixel(100, 100), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn annotated_pass_reports_the_same_detection() {
        let img = disks(200, 300, &[(100, 100), (100, 250)], 30);
        let params = DetectorParams {
            annotate: false,
            render_mask: true,
            ..luminance()
        };
        let plain = detect_image(&img, &params).expect("detect");
        let (annotated, _) = annotate_image(&img, &params).expect("annotate");
        assert_eq!(annotated, plain);
        assert_eq!(
            annotated.matrix().expect("matrix").to_rows(),
            vec![vec![-1], vec![0], vec![-1]]
        );
    }

    #[test]
    fn mask_uses_rule_inks() {
        let img = RgbaImage::from_fn(4, 1, |x, _| {
            if x < 2 {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([20, 20, 20, 255])
            }
        });
        let params = DetectorParams {
            classifier: ClassifierRule::luminance(0.5, LumaPolarity::Dark),
            ..DetectorParams::default()
        };
        let mask = mask_image(&img, &params).expect("mask");
        assert_eq!(mask.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(mask.get_pixel(3, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn invalid_params_surface_as_errors() {
        let img = disks(10, 10, &[], 1);
        let params = DetectorParams {
            classifier: ClassifierRule::luminance(2.0, LumaPolarity::Bright),
            ..DetectorParams::default()
        };
        assert!(matches!(
            detect_image(&img, &params),
            Err(DetectError::Params(_))
        ));
    }
}
