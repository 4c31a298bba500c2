//! The tracking reference frame and its re-basing on reset.

use nalgebra::Isometry3;

/// Handle to the coordinate system poses are queried in.
///
/// Frames are values: a reset produces a new frame, it never edits the
/// old one. Only host adapters should look at [`ReferenceFrame::origin_offset`];
/// the rest of the pipeline just passes the handle back into pose queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame {
    generation: u64,
    origin_offset: Isometry3<f32>,
}

impl ReferenceFrame {
    /// The frame the host hands out when the session starts.
    pub fn base() -> Self {
        Self {
            generation: 0,
            origin_offset: Isometry3::identity(),
        }
    }

    /// A frame whose origin sits at `origin_offset` in the host's native space.
    pub fn with_offset(origin_offset: Isometry3<f32>) -> Self {
        Self {
            generation: 0,
            origin_offset,
        }
    }

    /// The same frame with its origin moved by `correction`, expressed in
    /// this frame's coordinates.
    pub fn rebased(&self, correction: &Isometry3<f32>) -> Self {
        Self {
            generation: self.generation + 1,
            origin_offset: self.origin_offset * correction,
        }
    }

    /// Number of re-basings since the base frame.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pose of this frame's origin in the host's native space.
    pub fn origin_offset(&self) -> &Isometry3<f32> {
        &self.origin_offset
    }
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self::base()
    }
}

/// Owns the live reference frame.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFrameTracker {
    frame: ReferenceFrame,
}

impl ReferenceFrameTracker {
    pub fn new(frame: ReferenceFrame) -> Self {
        Self { frame }
    }

    pub fn current_frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    /// Apply a host reset. Without a correction the host knows of no origin
    /// shift and the frame is kept as is.
    ///
    /// Placements are stored in absolute world coordinates, so nothing
    /// besides future pose queries is affected.
    pub fn on_reset(&mut self, correction: Option<&Isometry3<f32>>) {
        match correction {
            Some(correction) => {
                let rebased = self.frame.rebased(correction);
                tracing::debug!(generation = rebased.generation(), "reference frame re-based");
                self.frame = rebased;
            }
            None => tracing::debug!("reference frame reset without correction"),
        }
    }
}
