//! Capabilities the pipeline borrows from its environment.
//!
//! A browser build implements these over WebXR and WebGL; the terminal
//! simulator and the tests implement them over plain state.

use nalgebra::Matrix4;

use crate::input::Viewport;
use crate::projection::ViewerPose;
use crate::reference::ReferenceFrame;

/// Session lifecycle on the tracking host.
///
/// Requests are fire-and-forget; the host reports completion by calling
/// `FrameLoop::session_ready` and `FrameLoop::reference_frame_ready`.
pub trait TrackingHost {
    /// Whether an immersive AR session can be started at all.
    fn is_supported(&self) -> bool;

    fn request_session(&mut self);

    fn request_reference_frame(&mut self);

    fn end_session(&mut self);
}

/// Token for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host-driven frame callback scheduling.
///
/// The callback is always `FrameLoop::on_frame`; the scheduler only has to
/// remember that one is wanted and fire it with the returned handle.
pub trait FrameScheduler {
    fn schedule_next(&mut self) -> FrameHandle;

    /// Must tolerate handles that already fired or were cancelled.
    fn cancel(&mut self, handle: FrameHandle);
}

/// Ambient lighting reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEstimate {
    pub intensity: f32,
    pub color: [f32; 3],
}

/// Per-frame queries, valid only while the frame callback runs.
pub trait FrameSource {
    /// `None` during a tracking gap.
    fn viewer_pose(&self, frame: &ReferenceFrame) -> Option<ViewerPose>;

    fn light_estimate(&self) -> Option<LightEstimate> {
        None
    }
}

/// What the frame loop needs from a renderer.
pub trait SceneRenderer {
    /// Draw one object per model matrix under the given camera.
    fn submit(&mut self, projection: &Matrix4<f32>, view: &Matrix4<f32>, models: &[Matrix4<f32>]);

    fn resize(&mut self, viewport: Viewport);
}
