use dotgrid_core::{FrameView, FrameViewMut, PixelFormat};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{DetectionResult, DetectorParams, FrameState, ParamsError};
use crate::annotate::annotate_markers;
use crate::blob::extract_blobs;
use crate::grid::infer_grid;
use crate::mask::{classify_frame, render_mask, BinaryMask};
use crate::validate::{judge_blob, Marker};

/// Circular marker detector with occupancy-grid inference.
///
/// The detector itself is immutable; anything that survives a frame lives in
/// the [`FrameState`] handed to [`MarkerGridDetector::process_frame`].
#[derive(Clone, Debug)]
pub struct MarkerGridDetector {
    params: DetectorParams,
}

impl MarkerGridDetector {
    /// Create a detector, rejecting out-of-range parameters.
    pub fn new(params: DetectorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Run detection on a read-only frame.
    ///
    /// Frames that are not BGRA8 yield an empty result.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn detect(&self, frame: &FrameView<'_>) -> DetectionResult {
        if !supported(frame.format()) {
            return DetectionResult::empty();
        }
        let mut mask = classify_frame(frame, &self.params.classifier);
        self.detect_in_mask(&mut mask)
    }

    /// Detect, optionally paint the mask and overlay, and advance `state`.
    ///
    /// The frame is only written to when `render_mask` or `annotate` is set.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, state), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn process_frame(
        &self,
        frame: &mut FrameViewMut<'_>,
        state: FrameState,
    ) -> (DetectionResult, FrameState) {
        if !supported(frame.format()) {
            return (DetectionResult::empty(), state.advance(0));
        }

        let mut mask = classify_frame(&frame.as_view(), &self.params.classifier);
        if self.params.render_mask {
            render_mask(&mask, frame, &self.params.classifier);
        }

        let result = self.detect_in_mask(&mut mask);
        if self.params.annotate {
            let painted = annotate_markers(
                frame,
                result.markers.iter().map(|m| m.center),
                &self.params.overlay,
            );
            log::trace!("overlay: {painted} pixels painted");
        }

        let state = state.advance(result.marker_count());
        (result, state)
    }

    fn detect_in_mask(&self, mask: &mut BinaryMask) -> DetectionResult {
        let markers = self.collect_markers(mask);
        let grid = infer_grid(&markers, &self.params.grid);
        match &grid {
            Some(layout) => log::debug!(
                "{} markers on a {} x {} grid",
                markers.len(),
                layout.matrix.rows(),
                layout.matrix.cols()
            ),
            None => log::debug!("{} markers, no grid", markers.len()),
        }
        DetectionResult { markers, grid }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn collect_markers(&self, mask: &mut BinaryMask) -> Vec<Marker> {
        let mut blobs = 0usize;
        let mut markers = Vec::new();
        for blob in extract_blobs(mask) {
            blobs += 1;
            match judge_blob(&blob, &self.params.blob_filter) {
                Ok(marker) => markers.push(marker),
                Err(reason) => log::trace!(
                    "blob at ({}, {}) rejected: {reason:?}",
                    blob.min_x,
                    blob.min_y
                ),
            }
        }
        log::debug!("{blobs} blobs, {} accepted", markers.len());
        markers
    }
}

fn supported(format: PixelFormat) -> bool {
    if format == PixelFormat::Bgra8 {
        return true;
    }
    log::debug!("unsupported pixel format {format:?}, skipping frame");
    false
}

/// One-shot detection with a temporary detector.
pub fn detect_markers(
    frame: &FrameView<'_>,
    params: &DetectorParams,
) -> Result<DetectionResult, ParamsError> {
    Ok(MarkerGridDetector::new(params.clone())?.detect(frame))
}
