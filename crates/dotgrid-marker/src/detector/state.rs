use serde::{Deserialize, Serialize};

/// Temporal stability counter carried between frames by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameState {
    /// Marker count of the previous frame, `None` before the first frame.
    pub previous_marker_count: Option<usize>,
    /// Consecutive frames whose marker count matched the one before.
    pub stable_frames: u32,
}

impl FrameState {
    /// State after a frame that produced `marker_count` markers.
    #[must_use]
    pub fn advance(self, marker_count: usize) -> FrameState {
        let stable_frames = if self.previous_marker_count == Some(marker_count) {
            self.stable_frames.saturating_add(1)
        } else {
            0
        };
        FrameState {
            previous_marker_count: Some(marker_count),
            stable_frames,
        }
    }

    /// `true` once the count has held for at least `required` frames.
    #[inline]
    pub fn is_stable(&self, required: u32) -> bool {
        self.previous_marker_count.is_some() && self.stable_frames >= required
    }
}
